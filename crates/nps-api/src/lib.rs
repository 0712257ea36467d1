//! # nps-api
//!
//! HTTP surface of nps-insights: dashboard reads over the Row Source and the
//! theme pipeline, enrichment triggers, and the ad-hoc survey job.
//!
//! The binary (`src/main.rs`) owns process concerns (logging, database
//! connection, listener); this library owns state, routing and handlers so
//! the router can be driven in tests without a socket.

pub mod error;
pub mod handlers;
pub mod query_types;
pub mod upload;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use nps_core::defaults::UPLOAD_MAX_BYTES;
use nps_core::{
    EmbeddingBackend, EnrichmentRepository, GenerationBackend, ResponseRepository,
    SurveyAnalysisRepository,
};
use nps_db::Database;
use nps_jobs::RunConfig;
use nps_themes::ThemeNormalizer;

pub use error::ApiError;

/// Multipart overhead allowed on top of the file size limit.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub responses: Arc<dyn ResponseRepository>,
    pub enrichments: Arc<dyn EnrichmentRepository>,
    pub surveys: Arc<dyn SurveyAnalysisRepository>,
    /// `None` when no LLM credentials are configured.
    pub generator: Option<Arc<dyn GenerationBackend>>,
    pub embedder: Option<Arc<dyn EmbeddingBackend>>,
    pub normalizer: Arc<ThemeNormalizer>,
    pub run_config: RunConfig,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            responses: Arc::new(db.responses),
            enrichments: Arc::new(db.enrichments),
            surveys: Arc::new(db.surveys),
            generator: None,
            embedder: None,
            normalizer: Arc::new(ThemeNormalizer::default()),
            run_config: RunConfig::default(),
        }
    }

    /// Use one backend for both generation and embeddings.
    pub fn with_backend<B>(mut self, backend: Arc<B>) -> Self
    where
        B: GenerationBackend + EmbeddingBackend + 'static,
    {
        self.generator = Some(backend.clone());
        self.embedder = Some(backend);
        self
    }

    pub fn with_run_config(mut self, run_config: RunConfig) -> Self {
        self.run_config = run_config;
        self
    }

    pub fn with_normalizer(mut self, normalizer: ThemeNormalizer) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    /// The generation backend, or the configuration failure.
    pub fn generator(&self) -> Result<Arc<dyn GenerationBackend>, ApiError> {
        self.generator.clone().ok_or_else(ApiError::not_configured)
    }

    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingBackend>, ApiError> {
        self.embedder.clone().ok_or_else(ApiError::not_configured)
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// All routes with the state applied, without transport middleware.
pub fn create_router(state: AppState) -> Router {
    use handlers::{dashboard, enrichment, survey, themes};

    Router::new()
        .route("/health", get(handlers::health_check))
        // Row Source reads
        .route("/api/filters", get(dashboard::filter_options))
        .route("/api/kpis", get(dashboard::kpis))
        .route("/api/trends", get(dashboard::monthly_trend))
        .route("/api/trends/movers", get(dashboard::top_movers))
        .route("/api/nps/by-survey", get(dashboard::nps_by_survey))
        .route("/api/nps/by-title", get(dashboard::nps_by_title))
        .route("/api/nps/audit", get(dashboard::audit))
        .route("/api/responses", get(dashboard::list_responses))
        .route("/api/responses/recent", get(dashboard::recent_responses))
        .route("/api/responses/similar", get(dashboard::similar_responses))
        // Theme pipeline
        .route("/api/themes", get(themes::theme_summaries))
        .route("/api/themes/other-breakdown", get(themes::other_breakdown))
        .route("/api/themes/by-month", get(themes::themes_by_month))
        .route("/api/themes/by-title", get(themes::themes_by_title))
        .route("/api/themes/drivers", get(themes::theme_drivers))
        .route("/api/themes/sub-themes", post(themes::sub_themes))
        .route("/api/theme-hierarchy", get(themes::theme_hierarchy))
        // Theme Assigner
        .route("/api/ai/discover-themes", post(enrichment::discover_themes))
        .route("/api/enrich", post(enrichment::enrich))
        .route("/api/enrichment-stats", get(enrichment::enrichment_stats))
        // Ad-hoc survey job
        .route(
            "/api/survey-analysis/upload",
            post(survey::upload).layer(DefaultBodyLimit::max(UPLOAD_MAX_BYTES + BODY_LIMIT_SLACK)),
        )
        .route("/api/survey-analysis/process", post(survey::process))
        .route("/api/survey-analysis/status", get(survey::status))
        .route("/api/survey-analysis/details", get(survey::details))
        .with_state(state)
}

/// Parse `ALLOWED_ORIGINS` (comma-separated); defaults to the local dashboard.
pub fn parse_allowed_origins(raw: Option<&str>) -> Vec<HeaderValue> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return vec![HeaderValue::from_static("http://localhost:3000")];
    };
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(subsystem = "api", origin = trimmed, error = %e, "Invalid CORS origin");
                    None
                }
            }
        })
        .collect()
}

/// Router with request IDs, tracing, CORS, panic catching and body limits.
///
/// Oversized bodies are answered with the JSON error shape like any other
/// failure.
pub fn create_app(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    create_router(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(UPLOAD_MAX_BYTES + BODY_LIMIT_SLACK))
        .layer(middleware::map_response(error::json_payload_too_large))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_origins_default() {
        let origins = parse_allowed_origins(None);
        assert_eq!(origins, vec![HeaderValue::from_static("http://localhost:3000")]);
        assert_eq!(parse_allowed_origins(Some("  ")).len(), 1);
    }

    #[test]
    fn test_allowed_origins_list() {
        let origins = parse_allowed_origins(Some("https://nps.example.com, http://localhost:3008,"));
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], HeaderValue::from_static("http://localhost:3008"));
    }

    #[test]
    fn test_request_ids_are_v7() {
        let mut maker = MakeRequestUuidV7;
        let request = axum::http::Request::new(());
        let id = maker.make_request_id(&request).unwrap();
        let parsed: Uuid = id.header_value().to_str().unwrap().parse().unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }
}
