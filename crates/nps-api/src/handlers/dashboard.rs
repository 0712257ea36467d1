//! Row Source reads: filters, KPIs, trends, grouped NPS and responses.

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use nps_core::defaults::{
    AUDIT_WINDOW_DAYS, MOM_MIN_RESPONSES, MOM_TOP_K, PAGE_LIMIT, RECENT_RESPONSES_LIMIT, SIMILAR_RESPONSES_LIMIT,
    TITLE_MIN_RESPONSES,
};
use nps_core::{
    FilterOptions, GroupNps, MonthlyNps, NpsKpis, NpsResponse, SimilarResponse, TitleMove,
};

use nps_themes::{run_audit, AuditInputs, AuditResult};

use crate::error::{or_empty, ApiError};
use crate::query_types::{ApiQuery, DashboardQuery};
use crate::AppState;

pub async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptions>, ApiError> {
    Ok(Json(or_empty(
        state.responses.filter_options().await,
        "filter_options",
    )?))
}

pub async fn kpis(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<NpsKpis>, ApiError> {
    let filter = query.filter()?;
    Ok(Json(or_empty(state.responses.kpis(&filter).await, "kpis")?))
}

pub async fn monthly_trend(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<MonthlyNps>>, ApiError> {
    let filter = query.filter()?;
    Ok(Json(or_empty(
        state.responses.monthly_trend(&filter).await,
        "monthly_trend",
    )?))
}

pub async fn top_movers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<TitleMove>>, ApiError> {
    let filter = query.filter()?;
    let rows = or_empty(
        state.responses.title_month_nps(&filter).await,
        "title_month_nps",
    )?;
    Ok(Json(nps_themes::top_movers(
        &rows,
        query.min_responses.unwrap_or(MOM_MIN_RESPONSES),
        query.top_k.unwrap_or(MOM_TOP_K),
    )))
}

pub async fn nps_by_survey(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<GroupNps>>, ApiError> {
    let filter = query.filter()?;
    Ok(Json(or_empty(
        state.responses.nps_by_survey(&filter).await,
        "nps_by_survey",
    )?))
}

pub async fn nps_by_title(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<GroupNps>>, ApiError> {
    let filter = query.filter()?;
    let min = query.min_responses.unwrap_or(TITLE_MIN_RESPONSES);
    Ok(Json(or_empty(
        state.responses.nps_by_title(&filter, min).await,
        "nps_by_title",
    )?))
}

pub async fn list_responses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<NpsResponse>>, ApiError> {
    let filter = query.filter()?;
    Ok(Json(or_empty(
        state
            .responses
            .list(&filter, query.limit_or(PAGE_LIMIT), query.offset())
            .await,
        "list_responses",
    )?))
}

pub async fn recent_responses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<NpsResponse>>, ApiError> {
    Ok(Json(or_empty(
        state
            .responses
            .recent(query.limit_or(RECENT_RESPONSES_LIMIT))
            .await,
        "recent_responses",
    )?))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// Embed the query text and return the nearest enriched responses.
pub async fn similar_responses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SimilarQuery>,
) -> Result<Json<Vec<SimilarResponse>>, ApiError> {
    let text = query
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query text 'q' is required"))?;
    let embedder = state.embedder()?;

    let vector = embedder
        .embed_texts(std::slice::from_ref(&text))
        .await?
        .pop()
        .ok_or_else(|| {
            ApiError::Internal(nps_core::Error::Inference(
                "Embedding backend returned no vector".to_string(),
            ))
        })?;
    let limit = DashboardQuery {
        limit: query.limit,
        ..Default::default()
    }
    .limit_or(SIMILAR_RESPONSES_LIMIT);

    Ok(Json(or_empty(
        state.enrichments.similar(&vector, limit).await,
        "similar_responses",
    )?))
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub results: Vec<AuditResult>,
}

/// Survey health audit over the recent Row Source.
///
/// Without data every data-driven rule reports `skip`.
pub async fn audit(State(state): State<AppState>) -> Result<Json<AuditResponse>, ApiError> {
    let now = Utc::now();
    let rows = or_empty(
        state
            .responses
            .responses_since(now - Duration::days(AUDIT_WINDOW_DAYS))
            .await,
        "responses_since",
    )?;
    let inputs = AuditInputs::from_responses(&rows, now);
    Ok(Json(AuditResponse {
        results: run_audit(&inputs),
    }))
}
