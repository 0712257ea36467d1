//! # nps-inference
//!
//! LLM access for nps-insights.
//!
//! This crate provides:
//! - OpenAI-compatible generation and embedding backend (feature `openai`)
//! - The Dutch NPS theme classifier and its taxonomy
//! - Theme discovery over sampled comments
//! - Per-response analysis and sub-theme prompts for ad-hoc surveys
//! - Defensive parsing of model replies (strict, salvage, scrape)
//!
//! # Feature Flags
//!
//! - `openai` (default): Enable the OpenAI-compatible backend
//! - `mock`: Expose [`mock::MockGenerationBackend`] to dependent crates' tests

pub mod classifier;
pub mod discovery;
pub mod salvage;
pub mod survey_prompts;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use classifier::{
    build_classify_prompt, extended_taxonomy, parse_classification, ResponseClassifier,
    THEME_TAXONOMY,
};
pub use discovery::{ThemeDiscovery, BASE_THEMES};
pub use salvage::ParsePath;
pub use survey_prompts::SurveyAnalyzer;

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
