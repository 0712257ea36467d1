//! Filter context shared by every read path.
//!
//! A [`FilterContext`] is what the dashboard passes through its query string:
//! an inclusive creation-date range plus optional survey and title equality
//! filters. Absent bounds mean "the full known data range".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{MAX_SCORE, PASSIVE_MIN_SCORE, PROMOTER_MIN_SCORE};
use crate::error::{Error, Result};
use crate::models::NpsCategory;

// =============================================================================
// FILTER CONTEXT
// =============================================================================

/// Row Source filter: inclusive date range plus survey/title equality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterContext {
    /// Inclusive lower bound on `creation_date`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `creation_date`.
    pub end: Option<DateTime<Utc>>,
    pub survey: Option<String>,
    pub title: Option<String>,
}

impl FilterContext {
    /// Filter with no restrictions.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_survey(mut self, survey: impl Into<String>) -> Self {
        self.survey = Some(survey.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether no filter is set at all.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.survey.is_none() && self.title.is_none()
    }

    /// Reject inverted ranges and blank equality filters.
    ///
    /// Blank `survey`/`title` strings are normalized to `None` so that
    /// `?survey=` behaves like an omitted parameter.
    pub fn validated(mut self) -> Result<Self> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(Error::InvalidInput(format!(
                    "start ({}) is after end ({})",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )));
            }
        }
        self.survey = self.survey.filter(|s| !s.trim().is_empty());
        self.title = self.title.filter(|t| !t.trim().is_empty());
        Ok(self)
    }

    /// Whether a timestamp/survey/title triple falls inside this context.
    ///
    /// Mirrors the SQL predicate so in-memory paths agree with the database.
    pub fn matches(&self, created: DateTime<Utc>, survey: &str, title: Option<&str>) -> bool {
        if self.start.is_some_and(|s| created < s) {
            return false;
        }
        if self.end.is_some_and(|e| created > e) {
            return false;
        }
        if self.survey.as_deref().is_some_and(|s| s != survey) {
            return false;
        }
        match (&self.title, title) {
            (Some(want), Some(have)) => want == have,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

// =============================================================================
// NPS BUCKET
// =============================================================================

/// Optional score-band restriction for theme aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpsBucket {
    Promoter,
    Passive,
    Detractor,
}

impl NpsBucket {
    /// Inclusive score range of this bucket.
    pub fn score_range(&self) -> (i16, i16) {
        match self {
            Self::Promoter => (PROMOTER_MIN_SCORE, MAX_SCORE),
            Self::Passive => (PASSIVE_MIN_SCORE, PROMOTER_MIN_SCORE - 1),
            Self::Detractor => (0, PASSIVE_MIN_SCORE - 1),
        }
    }

    pub fn contains(&self, score: i16) -> bool {
        NpsCategory::from_score(score) == NpsCategory::from(*self)
    }
}

impl From<NpsBucket> for NpsCategory {
    fn from(bucket: NpsBucket) -> Self {
        match bucket {
            NpsBucket::Promoter => NpsCategory::Promoter,
            NpsBucket::Passive => NpsCategory::Passive,
            NpsBucket::Detractor => NpsCategory::Detractor,
        }
    }
}

impl std::str::FromStr for NpsBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "promoter" | "promoters" => Ok(Self::Promoter),
            "passive" | "passives" => Ok(Self::Passive),
            "detractor" | "detractors" => Ok(Self::Detractor),
            other => Err(Error::InvalidInput(format!(
                "Unknown NPS bucket '{}'. Expected promoter, passive, or detractor",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_is_unbounded() {
        assert!(FilterContext::all().is_unbounded());
        assert!(!FilterContext::all().with_title("X").is_unbounded());
    }

    #[test]
    fn test_validated_rejects_inverted_range() {
        let filter = FilterContext::all().with_range(Some(ts(2024, 2, 1)), Some(ts(2024, 1, 1)));
        let err = filter.validated().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_validated_blanks_become_none() {
        let filter = FilterContext {
            survey: Some("  ".into()),
            title: Some(String::new()),
            ..Default::default()
        }
        .validated()
        .unwrap();
        assert!(filter.survey.is_none());
        assert!(filter.title.is_none());
    }

    #[test]
    fn test_matches_inclusive_range() {
        let filter = FilterContext::all().with_range(Some(ts(2024, 1, 1)), Some(ts(2024, 1, 31)));
        assert!(filter.matches(ts(2024, 1, 1), "s", None));
        assert!(filter.matches(ts(2024, 1, 31), "s", None));
        assert!(!filter.matches(ts(2024, 2, 1), "s", None));
    }

    #[test]
    fn test_matches_title_requires_title() {
        let filter = FilterContext::all().with_title("X");
        assert!(filter.matches(ts(2024, 1, 1), "s", Some("X")));
        assert!(!filter.matches(ts(2024, 1, 1), "s", Some("Y")));
        assert!(!filter.matches(ts(2024, 1, 1), "s", None));
    }

    #[test]
    fn test_bucket_parse_and_contains() {
        let bucket: NpsBucket = "Promoters".parse().unwrap();
        assert_eq!(bucket, NpsBucket::Promoter);
        assert!(bucket.contains(9));
        assert!(!bucket.contains(8));
        assert!(NpsBucket::Passive.contains(7));
        assert!(NpsBucket::Detractor.contains(0));
        assert!("sometimes".parse::<NpsBucket>().is_err());
    }

    #[test]
    fn test_bucket_score_ranges() {
        assert_eq!(NpsBucket::Promoter.score_range(), (9, 10));
        assert_eq!(NpsBucket::Passive.score_range(), (7, 8));
        assert_eq!(NpsBucket::Detractor.score_range(), (0, 6));
    }
}
