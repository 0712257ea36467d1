//! Centralized default constants for the nps-insights system.
//!
//! **This module is the single source of truth** for all shared default values.
//! Thresholds that used to drift between call sites (cluster minimums,
//! relevance cut-offs, upload limits) are defined once here and referenced
//! everywhere else.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section.

// =============================================================================
// NPS BANDS
// =============================================================================

/// Lowest score counted as a promoter.
pub const PROMOTER_MIN_SCORE: i16 = 9;

/// Lowest score counted as a passive (scores below are detractors).
pub const PASSIVE_MIN_SCORE: i16 = 7;

/// Highest valid NPS answer.
pub const MAX_SCORE: i16 = 10;

// =============================================================================
// THEME AGGREGATION
// =============================================================================

/// Themes with fewer mentions than this collapse into the Other cluster.
pub const OTHER_CLUSTER_MIN_MENTIONS: i64 = 3;

/// Display name of the collapsed low-frequency bucket.
pub const OTHER_CLUSTER_NAME: &str = "Other (cluster)";

/// Mention count at or above which a theme is of high business relevance.
pub const HIGH_RELEVANCE_MENTIONS: i64 = 100;

/// Mention count below which a theme is of low business relevance.
pub const LOW_RELEVANCE_MENTIONS: i64 = 10;

/// Predefined business categories. Everything else on the dashboard is
/// AI-discovered.
pub const BASE_THEMES: &[&str] = &["content_kwaliteit", "pricing", "merkvertrouwen", "overige"];

/// Confidence reported for predefined (base) themes.
pub const BASE_THEME_CONFIDENCE: f64 = 1.0;

/// Confidence reported for AI-discovered themes.
pub const AI_THEME_CONFIDENCE: f64 = 0.8;

/// Maximum keywords used when explaining an AI-discovered theme.
pub const EXPLANATION_KEYWORDS: usize = 5;

/// Minimum word length considered when extracting explanation keywords.
pub const EXPLANATION_MIN_WORD_LEN: usize = 3;

// =============================================================================
// TRENDS
// =============================================================================

/// Minimum responses for a title to appear in per-title NPS rankings.
pub const TITLE_MIN_RESPONSES: i64 = 10;

/// Minimum responses in both months for a month-over-month move to count.
pub const MOM_MIN_RESPONSES: i64 = 30;

/// Number of up and down movers returned.
pub const MOM_TOP_K: usize = 5;

// =============================================================================
// ENRICHMENT (THEME ASSIGNER)
// =============================================================================

/// Responses fetched per enrichment trigger.
pub const ENRICH_BATCH_SIZE: i64 = 100;

/// Responses sampled for theme discovery.
pub const DISCOVERY_SAMPLE_SIZE: usize = 100;

/// Comments must be longer than this to be sampled for discovery.
pub const DISCOVERY_MIN_COMMENT_CHARS: usize = 10;

/// Upper bound on themes accepted from one discovery call.
pub const DISCOVERY_MAX_THEMES: usize = 5;

/// Fixed pause between per-response LLM calls, in milliseconds.
pub const LLM_CALL_DELAY_MS: u64 = 100;

/// Sentiment above this is labelled positive, below its negation negative.
pub const SENTIMENT_LABEL_THRESHOLD: f64 = 0.1;

/// Theme assigned when the classifier output is unusable.
pub const FALLBACK_THEME: &str = "overige";

/// Placeholders that mean "no comment" (compared trimmed, lowercase).
pub const EMPTY_COMMENT_STOPLIST: &[&str] = &["", "n.v.t.", "nvt", "n.v.t", "n/a", "na", "-"];

// =============================================================================
// SURVEY HEALTH AUDIT
// =============================================================================

/// Look-back for volume, verbatim share and score distribution.
pub const AUDIT_WINDOW_DAYS: i64 = 90;

/// Look-back for the response-rate proxy and respondent fatigue.
pub const AUDIT_RECENT_DAYS: i64 = 30;

/// Look-back for week-over-week stability (12 weeks).
pub const AUDIT_STABILITY_DAYS: i64 = 84;

/// Comments must be longer than this (trimmed) to count as verbatim.
pub const AUDIT_VERBATIM_MIN_CHARS: usize = 2;

/// Response rate at or above which the rule passes, and warns.
pub const AUDIT_RESPONSE_RATE_PASS: f64 = 0.20;
pub const AUDIT_RESPONSE_RATE_WARN: f64 = 0.10;

/// Verbatim share at or above which the rule passes, and warns.
pub const AUDIT_VERBATIM_PASS: f64 = 0.55;
pub const AUDIT_VERBATIM_WARN: f64 = 0.35;

/// Respondents surveyed this often in the recent window count as fatigued.
pub const AUDIT_FATIGUE_MIN_SURVEYS: i64 = 2;

/// Fatigued respondents tolerated before the rule fails.
pub const AUDIT_FATIGUE_WARN_MAX: usize = 5;

/// In-app share at or above which the channel mix passes, and warns.
pub const AUDIT_IN_APP_PASS: f64 = 0.5;
pub const AUDIT_IN_APP_WARN: f64 = 0.3;

/// Week-over-week NPS standard deviation (points) considered unstable.
pub const AUDIT_STABILITY_MAX_STDDEV: f64 = 8.0;

/// Below this many responses instability only warns.
pub const AUDIT_STABILITY_MIN_RESPONSES: i64 = 100;

/// Average completion seconds at or below which the rule passes, and warns.
pub const AUDIT_COMPLETION_PASS_SECS: f64 = 25.0;
pub const AUDIT_COMPLETION_WARN_SECS: f64 = 45.0;

/// Segments below this coverage count as under-sampled.
pub const AUDIT_SEGMENT_MIN_COVERAGE: f64 = 0.1;

/// Under-sampled segments tolerated before the rule fails.
pub const AUDIT_SEGMENT_WARN_MAX: usize = 2;

/// Response volume at or above which the rule passes, and warns.
pub const AUDIT_VOLUME_PASS: i64 = 1000;
pub const AUDIT_VOLUME_WARN: i64 = 500;

/// NPS at or above which the distribution passes, and warns.
pub const AUDIT_NPS_PASS: f64 = 0.0;
pub const AUDIT_NPS_WARN: f64 = -10.0;

// =============================================================================
// AD-HOC SURVEY ANALYSIS
// =============================================================================

/// Maximum accepted upload size in bytes (10 MiB).
pub const UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Responses must be longer than this many characters to be kept.
pub const MIN_RESPONSE_CHARS: usize = 10;

/// Quotes in generated insights are cut to this many characters.
pub const QUOTE_MAX_CHARS: usize = 150;

/// Quotes in the action plan are cut to this many characters.
pub const ACTION_PLAN_QUOTE_CHARS: usize = 200;

/// Number of themes that receive a full narrative insight.
pub const TOP_THEME_INSIGHTS: usize = 5;

/// Number of themes covered by the action plan.
pub const ACTION_PLAN_THEMES: usize = 3;

/// Sample responses stored per ad-hoc theme.
pub const SAMPLE_RESPONSES_PER_THEME: usize = 3;

/// Sample responses returned by the details endpoint.
pub const DETAIL_SAMPLE_RESPONSES: i64 = 10;

/// Responses sent to the LLM for sub-theme discovery.
pub const SUB_THEME_SAMPLE_SIZE: usize = 20;

/// Neutral sentiment on the 0..1 ad-hoc scale.
pub const NEUTRAL_SENTIMENT: f64 = 0.5;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints.
pub const PAGE_LIMIT: i64 = 50;

/// Maximum page size accepted from clients.
pub const PAGE_LIMIT_MAX: i64 = 500;

/// Default number of recent responses.
pub const RECENT_RESPONSES_LIMIT: i64 = 10;

/// Default number of similar responses.
pub const SIMILAR_RESPONSES_LIMIT: i64 = 10;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Default embedding model.
pub const EMBED_MODEL: &str = "text-embedding-3-large";

/// Embedding dimension for text-embedding-3-large.
pub const EMBED_DIMENSION: usize = 3072;

/// Request timeout for inference calls, in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Sampling temperature for per-response classification calls.
pub const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Sampling temperature for theme discovery.
pub const DISCOVERY_TEMPERATURE: f32 = 0.1;

/// Token cap for theme discovery replies.
pub const DISCOVERY_MAX_TOKENS: u32 = 800;

/// Token cap for sub-theme discovery replies.
pub const SUB_THEME_MAX_TOKENS: u32 = 1500;

/// Sampling temperature for ad-hoc survey analysis calls.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default database URL when DATABASE_URL is unset.
pub const DATABASE_URL: &str = "postgres://localhost/nps";
