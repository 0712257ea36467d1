//! # nps-core
//!
//! Core types, traits, and abstractions for the nps-insights reporting backend.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the database, inference, theme pipeline, job, and API crates depend on.

pub mod defaults;
pub mod error;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use filter::{FilterContext, NpsBucket};
pub use metrics::{nps_score, percentage, round_to};
pub use models::*;
pub use traits::*;
