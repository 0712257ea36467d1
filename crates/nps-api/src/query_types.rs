//! Query-string and body extraction with JSON error bodies.
//!
//! Dashboard filters arrive as `start`, `end`, `survey` and `title`. Dates
//! may be a plain `YYYY-MM-DD` or RFC 3339; a plain `end` date covers the
//! whole day.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};

use nps_core::defaults::PAGE_LIMIT_MAX;
use nps_core::{FilterContext, NpsBucket};

use crate::error::ApiError;

// =============================================================================
// EXTRACTORS
// =============================================================================

/// `Query<T>` whose rejection is an [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Self(value))
    }
}

/// `Json<T>` whose rejection is an [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Self(value))
    }
}

// =============================================================================
// DATE BOUNDS
// =============================================================================

/// Which end of a range a date bound closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Parse a range bound.
///
/// Accepts RFC 3339 (`2024-01-15T10:30:00Z`), a naive timestamp taken as UTC
/// (`2024-01-15T10:30:00`), or a date (`2024-01-15`). A date opens at
/// midnight for [`Bound::Start`] and closes at the last microsecond of the
/// day for [`Bound::End`].
pub fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>, ApiError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => NaiveTime::from_hms_opt(0, 0, 0),
            Bound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999),
        }
        .ok_or_else(|| ApiError::bad_request(format!("Invalid date '{}'", s)))?;
        return Ok(date.and_time(time).and_utc());
    }
    Err(ApiError::bad_request(format!(
        "Invalid date '{}'. Expected YYYY-MM-DD or RFC 3339 (e.g., '2024-01-15T10:30:00Z')",
        s
    )))
}

// =============================================================================
// DASHBOARD QUERY
// =============================================================================

/// Query parameters shared by the dashboard read endpoints.
///
/// Endpoints read the fields they need and ignore the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub survey: Option<String>,
    pub title: Option<String>,
    pub nps_bucket: Option<String>,
    pub min_responses: Option<i64>,
    pub top_k: Option<usize>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl DashboardQuery {
    /// The validated filter context; blank values count as absent.
    pub fn filter(&self) -> Result<FilterContext, ApiError> {
        let bound = |value: &Option<String>, which| -> Result<_, ApiError> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_bound(v, which))
                .transpose()
        };
        let filter = FilterContext {
            start: bound(&self.start, Bound::Start)?,
            end: bound(&self.end, Bound::End)?,
            survey: self.survey.clone(),
            title: self.title.clone(),
        };
        Ok(filter.validated()?)
    }

    pub fn bucket(&self) -> Result<Option<NpsBucket>, ApiError> {
        match self.nps_bucket.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => Ok(Some(raw.parse()?)),
        }
    }

    /// Page size clamped to `1..=PAGE_LIMIT_MAX`.
    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, PAGE_LIMIT_MAX)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_only_end_covers_whole_day() {
        let end = parse_bound("2024-01-31", Bound::End).unwrap();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap());

        let start = parse_bound("2024-01-01", Bound::Start).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rfc3339_and_naive_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_bound("2024-01-15T10:30:00Z", Bound::End).unwrap(), expected);
        assert_eq!(parse_bound("2024-01-15T12:30:00+02:00", Bound::Start).unwrap(), expected);
        assert_eq!(parse_bound("2024-01-15T10:30:00", Bound::Start).unwrap(), expected);
    }

    #[test]
    fn test_invalid_date_is_bad_request() {
        let err = parse_bound("15/01/2024", Bound::Start).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_filter_blank_values_are_absent() {
        let query = DashboardQuery {
            start: Some(String::new()),
            survey: Some(" ".to_string()),
            title: Some("X".to_string()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert!(filter.start.is_none());
        assert!(filter.survey.is_none());
        assert_eq!(filter.title.as_deref(), Some("X"));
    }

    #[test]
    fn test_filter_rejects_inverted_range() {
        let query = DashboardQuery {
            start: Some("2024-02-01".to_string()),
            end: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_bucket_parsing() {
        let mut query = DashboardQuery::default();
        assert_eq!(query.bucket().unwrap(), None);
        query.nps_bucket = Some("detractors".to_string());
        assert_eq!(query.bucket().unwrap(), Some(NpsBucket::Detractor));
        query.nps_bucket = Some("fans".to_string());
        assert!(query.bucket().is_err());
    }

    #[test]
    fn test_limit_clamped() {
        let query = DashboardQuery {
            limit: Some(100_000),
            ..Default::default()
        };
        assert_eq!(query.limit_or(10), PAGE_LIMIT_MAX);
        assert_eq!(DashboardQuery::default().limit_or(10), 10);
    }
}
