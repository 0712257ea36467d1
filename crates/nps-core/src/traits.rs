//! Core traits for nps-insights abstractions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::filter::{FilterContext, NpsBucket};
use crate::models::*;
use crate::Result;

// =============================================================================
// ROW SOURCE
// =============================================================================

/// Read access to raw survey responses (the Row Source).
///
/// Every query applies the [`FilterContext`] as an inclusive range on
/// `creation_date` plus equality on survey and title.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Insert a response, returning its ID.
    async fn insert(&self, req: NewNpsResponse) -> Result<Uuid>;

    /// Page through matching responses, newest first.
    async fn list(&self, filter: &FilterContext, limit: i64, offset: i64)
        -> Result<Vec<NpsResponse>>;

    /// Band counts, NPS, and average score for the context.
    async fn kpis(&self, filter: &FilterContext) -> Result<NpsKpis>;

    /// NPS per calendar month, ascending.
    async fn monthly_trend(&self, filter: &FilterContext) -> Result<Vec<MonthlyNps>>;

    /// NPS per survey, best first.
    async fn nps_by_survey(&self, filter: &FilterContext) -> Result<Vec<GroupNps>>;

    /// NPS per title with at least `min_responses` responses, best first.
    async fn nps_by_title(&self, filter: &FilterContext, min_responses: i64)
        -> Result<Vec<GroupNps>>;

    /// Band counts per (title, month), input to month-over-month moves.
    async fn title_month_nps(&self, filter: &FilterContext) -> Result<Vec<TitleMonthNps>>;

    /// Most recently created responses.
    async fn recent(&self, limit: i64) -> Result<Vec<NpsResponse>>;

    /// Distinct survey and title names.
    async fn filter_options(&self) -> Result<FilterOptions>;

    /// Responses with an explanation and no enrichment yet, oldest first.
    async fn unenriched(&self, limit: i64) -> Result<Vec<NpsResponse>>;

    /// Random sample of comments longer than `min_chars`.
    async fn sample_comments(&self, limit: i64, min_chars: i32) -> Result<Vec<String>>;

    /// Every response created at or after `since`, oldest first. Input to
    /// the survey health audit.
    async fn responses_since(&self, since: DateTime<Utc>) -> Result<Vec<NpsResponse>>;
}

// =============================================================================
// ENRICHMENT STORE
// =============================================================================

/// Storage for AI enrichments (one per response, insert-only).
#[async_trait]
pub trait EnrichmentRepository: Send + Sync {
    /// Insert an enrichment. Returns `None` when the response already has one.
    async fn insert(&self, req: NewEnrichment) -> Result<Option<Uuid>>;

    /// Fetch the enrichment for a response.
    async fn get_for_response(&self, response_id: Uuid) -> Result<Option<Enrichment>>;

    /// All (response, theme) pairs inside the context, optionally restricted
    /// to one score band.
    async fn theme_assignments(
        &self,
        filter: &FilterContext,
        bucket: Option<NpsBucket>,
    ) -> Result<Vec<ThemeAssignment>>;

    /// Coverage of enrichment over commented responses.
    async fn stats(&self) -> Result<EnrichmentStats>;

    /// Nearest responses to a query vector by cosine similarity.
    async fn similar(&self, query: &Vector, limit: i64) -> Result<Vec<SimilarResponse>>;
}

// =============================================================================
// AD-HOC SURVEY STORE
// =============================================================================

/// Storage for ad-hoc survey analysis jobs and their results.
#[async_trait]
pub trait SurveyAnalysisRepository: Send + Sync {
    /// Create the job record (status `processing`) and its response rows.
    async fn create(&self, req: NewSurveyAnalysis) -> Result<SurveyAnalysis>;

    async fn get(&self, id: Uuid) -> Result<Option<SurveyAnalysis>>;

    /// All uploaded rows of a survey in row order.
    async fn responses(&self, id: Uuid) -> Result<Vec<SurveyResponseRow>>;

    /// First `limit` uploaded rows.
    async fn sample_responses(&self, id: Uuid, limit: i64) -> Result<Vec<SurveyResponseRow>>;

    /// Store the classifier verdict on an uploaded row.
    async fn record_analysis(&self, response_id: Uuid, analysis: &ResponseAnalysis) -> Result<()>;

    /// Persist how many responses have been processed so far.
    async fn record_progress(&self, id: Uuid, processed: i32) -> Result<()>;

    /// Delete all previous themes and insights of the survey and insert the new ones.
    async fn replace_results(
        &self,
        id: Uuid,
        themes: &[SurveyTheme],
        insights: &[Insight],
    ) -> Result<()>;

    /// Flip status to `completed`.
    async fn complete(&self, id: Uuid, total_responses: i32) -> Result<()>;

    /// Stored themes, most mentioned first.
    async fn themes(&self, id: Uuid) -> Result<Vec<SurveyTheme>>;

    /// Stored insights, highest priority first.
    async fn insights(&self, id: Uuid) -> Result<Vec<StoredInsight>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Request a single JSON object as the response body.
    pub json_object: bool,
}

impl GenerationOptions {
    /// Strict-JSON classification call.
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: None,
            json_object: true,
        }
    }

    /// Free-form call at the given temperature.
    pub fn text(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Backend for generating vector embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for a batch of texts.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the dimension of embeddings produced by this backend.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with per-call sampling options.
    ///
    /// Backends without native support for an option ignore it. JSON mode only
    /// asks the model for an object; the output is still untrusted and must be
    /// validated by the caller.
    async fn generate_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let _ = options;
        self.generate_with_system(system, prompt).await
    }

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
