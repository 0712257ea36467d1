//! OpenAI-compatible inference backend.
//!
//! Works with the OpenAI cloud API and any endpoint speaking the same
//! `/chat/completions` and `/embeddings` protocol (Azure OpenAI, vLLM,
//! LocalAI, Ollama in compatibility mode).
//!
//! # Example
//!
//! ```rust,no_run
//! use nps_inference::openai::OpenAIBackend;
//! use nps_core::{GenerationBackend, GenerationOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let reply = backend
//!         .generate_with_options("Antwoord in JSON.", "{}", &GenerationOptions::json(0.0))
//!         .await
//!         .unwrap();
//!     println!("{}", reply);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_core_error, OpenAIErrorCode};
pub use types::*;
