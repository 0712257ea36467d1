//! Theme Assigner triggers: vocabulary discovery, enrichment batches and
//! coverage stats.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use nps_core::defaults::{DISCOVERY_MIN_COMMENT_CHARS, DISCOVERY_SAMPLE_SIZE};
use nps_core::{DiscoveredTheme, EnrichRunSummary, EnrichmentStats};
use nps_inference::ThemeDiscovery;
use nps_jobs::{EnrichmentJob, JobContext, JobKind};

use crate::error::{or_empty, ApiError};
use crate::query_types::ApiJson;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverRequest {
    /// Comments to analyse; sampled from storage when absent.
    #[serde(default)]
    pub responses: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub themes: Vec<DiscoveredTheme>,
    pub model: String,
    pub sample_size: usize,
}

/// Ask the model for themes the base taxonomy misses.
pub async fn discover_themes(
    State(state): State<AppState>,
    body: Option<ApiJson<DiscoverRequest>>,
) -> Result<Json<DiscoverResponse>, ApiError> {
    let generator = state.generator()?;
    let supplied = body.and_then(|ApiJson(b)| b.responses).filter(|r| !r.is_empty());

    let comments = match supplied {
        Some(comments) => comments,
        None => {
            state
                .responses
                .sample_comments(
                    DISCOVERY_SAMPLE_SIZE as i64,
                    DISCOVERY_MIN_COMMENT_CHARS as i32,
                )
                .await?
        }
    };

    let model = generator.model_name().to_string();
    let themes = ThemeDiscovery::new(generator).discover(&comments).await?;
    info!(
        subsystem = "api",
        component = "discovery",
        sample_size = comments.len(),
        theme_count = themes.len(),
        "Theme discovery finished"
    );

    Ok(Json(DiscoverResponse {
        themes,
        model,
        sample_size: comments.len(),
    }))
}

/// Run one enrichment batch over unenriched responses.
pub async fn enrich(State(state): State<AppState>) -> Result<Json<EnrichRunSummary>, ApiError> {
    let generator = state.generator()?;
    let mut job = EnrichmentJob::new(
        state.responses.clone(),
        state.enrichments.clone(),
        generator,
    )
    .with_config(state.run_config.clone());
    if let Some(embedder) = state.embedder.clone() {
        job = job.with_embedder(embedder);
    }

    let ctx = JobContext::new(JobKind::Enrichment);
    let summary = job.run(&ctx).await?;
    Ok(Json(summary))
}

pub async fn enrichment_stats(
    State(state): State<AppState>,
) -> Result<Json<EnrichmentStats>, ApiError> {
    Ok(Json(or_empty(
        state.enrichments.stats().await,
        "enrichment_stats",
    )?))
}
