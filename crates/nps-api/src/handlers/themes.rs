//! Theme pipeline reads: Aggregator views, the Other cluster, the category
//! hierarchy and sub-theme discovery.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use nps_core::defaults::{OTHER_CLUSTER_MIN_MENTIONS, SUB_THEME_SAMPLE_SIZE};
use nps_core::{ClusterMember, SubTheme, ThemeAggregate, ThemeAssignment, ThemeDriver, ThemeSummary};
use nps_inference::SurveyAnalyzer;
use nps_themes::{GroupKey, SortOrder};

use crate::error::{or_empty, ApiError};
use crate::query_types::{ApiJson, ApiQuery, DashboardQuery};
use crate::AppState;

/// Assignments in the filter context, restricted to the requested bucket.
async fn assignments(
    state: &AppState,
    query: &DashboardQuery,
) -> Result<Vec<ThemeAssignment>, ApiError> {
    let filter = query.filter()?;
    let bucket = query.bucket()?;
    or_empty(
        state.enrichments.theme_assignments(&filter, bucket).await,
        "theme_assignments",
    )
}

#[derive(Debug, Serialize)]
pub struct ThemeSummariesResponse {
    pub themes: Vec<ThemeSummary>,
    pub total_mentions: i64,
    pub distinct_responses: i64,
}

/// Theme summaries with low-volume themes folded into the Other cluster.
pub async fn theme_summaries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<ThemeSummariesResponse>, ApiError> {
    let pairs = assignments(&state, &query).await?;
    let total_mentions = nps_themes::total_mentions(&pairs);
    let distinct_responses = nps_themes::distinct_responses(&pairs);

    let (collapsed, _members) = nps_themes::collapse_default(pairs.clone());
    let groups = nps_themes::aggregate(&collapsed, GroupKey::Theme, SortOrder::ByCount);

    Ok(Json(ThemeSummariesResponse {
        themes: nps_themes::summarize(groups, &pairs),
        total_mentions,
        distinct_responses,
    }))
}

#[derive(Debug, Serialize)]
pub struct OtherBreakdownResponse {
    pub other: Vec<ClusterMember>,
}

pub async fn other_breakdown(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<OtherBreakdownResponse>, ApiError> {
    let pairs = assignments(&state, &query).await?;
    let min = query.min_responses.unwrap_or(OTHER_CLUSTER_MIN_MENTIONS);
    Ok(Json(OtherBreakdownResponse {
        other: nps_themes::other_breakdown(&pairs, min),
    }))
}

pub async fn themes_by_month(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<ThemeAggregate>>, ApiError> {
    let pairs = assignments(&state, &query).await?;
    Ok(Json(nps_themes::aggregate(
        &pairs,
        GroupKey::ThemeMonth,
        SortOrder::Chronological,
    )))
}

pub async fn themes_by_title(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<ThemeAggregate>>, ApiError> {
    let pairs = assignments(&state, &query).await?;
    Ok(Json(nps_themes::aggregate(
        &pairs,
        GroupKey::ThemeTitle,
        SortOrder::ByCount,
    )))
}

/// Theme share per month for one title.
pub async fn theme_drivers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<Vec<ThemeDriver>>, ApiError> {
    if query.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(ApiError::bad_request("Query parameter 'title' is required"));
    }
    let pairs = assignments(&state, &query).await?;
    Ok(Json(nps_themes::theme_drivers(&pairs)))
}

#[derive(Debug, Deserialize)]
pub struct SubThemeRequest {
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub responses: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubThemeResponse {
    pub sub_themes: Vec<SubTheme>,
}

/// Split one theme into sub-themes from a sample of its responses.
pub async fn sub_themes(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SubThemeRequest>,
) -> Result<Json<SubThemeResponse>, ApiError> {
    if body.theme.trim().is_empty() || body.responses.is_empty() {
        return Err(ApiError::bad_request("Theme and responses are required"));
    }
    let analyzer = SurveyAnalyzer::new(state.generator()?);
    let sample: Vec<String> = body
        .responses
        .into_iter()
        .take(SUB_THEME_SAMPLE_SIZE)
        .collect();
    let sub_themes = analyzer.discover_sub_themes(&body.theme, &sample).await?;
    Ok(Json(SubThemeResponse { sub_themes }))
}

#[derive(Debug, Default, Deserialize)]
pub struct HierarchyQuery {
    pub view: Option<String>,
    pub theme: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub survey: Option<String>,
    pub title: Option<String>,
    pub nps_bucket: Option<String>,
}

impl HierarchyQuery {
    fn dashboard(self) -> DashboardQuery {
        DashboardQuery {
            start: self.start,
            end: self.end,
            survey: self.survey,
            title: self.title,
            nps_bucket: self.nps_bucket,
            ..Default::default()
        }
    }
}

/// Normalized category views: `hierarchy` (default), `stats` or `mapping`.
pub async fn theme_hierarchy(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HierarchyQuery>,
) -> Result<Json<JsonValue>, ApiError> {
    let view = query.view.clone().unwrap_or_else(|| "hierarchy".to_string());
    let view = view.as_str();
    if view == "mapping" {
        let theme = query
            .theme
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::bad_request("Query parameter 'theme' is required for the mapping view")
            })?;
        let mapping = nps_themes::mapping_view(&state.normalizer, theme);
        return to_json(&mapping);
    }
    if view != "hierarchy" && view != "stats" {
        return Err(ApiError::bad_request(format!(
            "Unknown view '{}'. Expected hierarchy, stats or mapping",
            view
        )));
    }

    let dashboard = query.dashboard();
    let pairs = assignments(&state, &dashboard).await?;
    let groups = nps_themes::aggregate(&pairs, GroupKey::Theme, SortOrder::ByCount);

    if view == "stats" {
        to_json(&nps_themes::mapping_stats(&state.normalizer, &groups))
    } else {
        to_json(&nps_themes::hierarchy(&state.normalizer, &groups))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Json<JsonValue>, ApiError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| ApiError::Internal(nps_core::Error::Serialization(e.to_string())))
}
