//! # nps-jobs
//!
//! HTTP-triggered batch runs for nps-insights.
//!
//! - [`EnrichmentJob`]: the Theme Assigner; classifies and embeds the
//!   unenriched backlog, isolating per-response failures
//! - [`SurveyProcessor`]: ad-hoc survey analysis with persisted progress and
//!   full replacement of previous results
//!
//! Both work against the repository and backend traits of `nps-core`, so
//! they run the same against PostgreSQL and in-memory test doubles.
//!
//! ## Example
//!
//! ```ignore
//! let job = EnrichmentJob::new(responses, enrichments, generator)
//!     .with_embedder(embedder)
//!     .with_config(RunConfig::from_env());
//! let summary = job.run(&JobContext::new(JobKind::Enrichment)).await?;
//! ```

pub mod enrichment;
pub mod handler;
pub mod survey;

pub use enrichment::{is_empty_comment, EnrichmentJob};
pub use handler::{JobContext, JobKind, ProgressCallback, RunConfig};
pub use survey::{SurveyProcessor, SurveyRunSummary};
