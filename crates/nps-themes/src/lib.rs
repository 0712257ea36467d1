//! # nps-themes
//!
//! Pure theme pipeline logic for nps-insights: no I/O, no async.
//!
//! - [`normalizer`]: raw label → canonical (main, sub) category, total and deterministic
//! - [`aggregate`]: per-theme statistics over (response, theme) mention pairs
//! - [`cluster`]: the "Other (cluster)" collapse and its drill-down
//! - [`explain`]: provenance, explanation and relevance for dashboard rows
//! - [`trends`]: month-over-month title movers and theme drivers
//! - [`insights`]: severity ranking and narrative insights for ad-hoc surveys
//! - [`audit`]: survey health rule table

pub mod aggregate;
pub mod audit;
pub mod cluster;
pub mod explain;
pub mod hierarchy;
pub mod insights;
pub mod normalizer;
pub mod patterns;
pub mod trends;

pub use aggregate::{aggregate, distinct_responses, restrict_to_bucket, total_mentions, GroupKey, SortOrder};
pub use audit::{run_audit, AuditInputs, AuditResult, AuditStatus};
pub use cluster::{collapse, collapse_default, other_breakdown};
pub use explain::summarize;
pub use hierarchy::{hierarchy, mapping_stats, mapping_view, CategoryNode, MappingStats, MappingView};
pub use insights::{InsightRenderer, RenderedAnalysis, SeverityPolicy};
pub use normalizer::{LearnedTier, MatchTier, ThemeNormalizer};
pub use patterns::{MainCategory, PatternTable};
pub use trends::{theme_drivers, top_movers};
