//! Core data models for nps-insights.
//!
//! These types are shared across all crates and represent the domain
//! entities of the reporting pipeline: raw responses, their enrichments,
//! canonical theme mappings, and the derived aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{
    HIGH_RELEVANCE_MENTIONS, LOW_RELEVANCE_MENTIONS, PASSIVE_MIN_SCORE, PROMOTER_MIN_SCORE,
    SENTIMENT_LABEL_THRESHOLD,
};

mod survey;
pub use survey::*;

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Score band of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpsCategory {
    Promoter,
    Passive,
    Detractor,
}

impl NpsCategory {
    /// Promoter for 9-10, passive for 7-8, detractor for 0-6.
    pub fn from_score(score: i16) -> Self {
        if score >= PROMOTER_MIN_SCORE {
            Self::Promoter
        } else if score >= PASSIVE_MIN_SCORE {
            Self::Passive
        } else {
            Self::Detractor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promoter => "promoter",
            Self::Passive => "passive",
            Self::Detractor => "detractor",
        }
    }
}

/// One survey submission, as stored in `nps_response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpsResponse {
    pub id: Uuid,
    pub nps_score: i16,
    pub nps_explanation: Option<String>,
    pub title_text: Option<String>,
    pub survey_name: String,
    pub creation_date: DateTime<Utc>,
}

impl NpsResponse {
    pub fn category(&self) -> NpsCategory {
        NpsCategory::from_score(self.nps_score)
    }
}

/// Request to insert a response (imports and tests).
#[derive(Debug, Clone)]
pub struct NewNpsResponse {
    pub nps_score: i16,
    pub nps_explanation: Option<String>,
    pub title_text: Option<String>,
    pub survey_name: String,
    pub creation_date: DateTime<Utc>,
}

// =============================================================================
// ENRICHMENT TYPES
// =============================================================================

/// Coarse sentiment label derived from the -1..1 sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Label a -1..1 score; a missing score is neutral.
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s > SENTIMENT_LABEL_THRESHOLD => Self::Positive,
            Some(s) if s < -SENTIMENT_LABEL_THRESHOLD => Self::Negative,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown sentiment label: {}",
                other
            ))),
        }
    }
}

/// Validated output of the LLM classifier for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub themes: Vec<String>,
    /// Per-theme confidence, clamped to [0, 1].
    pub theme_scores: BTreeMap<String, f64>,
    /// Sentiment in [-1, 1], or `None` when the model could not tell.
    pub sentiment: Option<f64>,
    pub keywords: Vec<String>,
    pub language: String,
}

/// Stored AI annotation of a response. Inserted once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrichment {
    pub id: Uuid,
    pub response_id: Uuid,
    pub themes: Vec<String>,
    pub theme_scores: BTreeMap<String, f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_label: SentimentLabel,
    pub promoter_flag: bool,
    pub passive_flag: bool,
    pub detractor_flag: bool,
    pub keywords: Vec<String>,
    pub language: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Request to persist an enrichment.
#[derive(Debug, Clone)]
pub struct NewEnrichment {
    pub response_id: Uuid,
    /// Band of the response score; flags are derived from it, never from the model.
    pub category: NpsCategory,
    pub classification: Classification,
    pub model: String,
    pub embedding: Option<Vector>,
}

impl NewEnrichment {
    pub fn sentiment_label(&self) -> SentimentLabel {
        SentimentLabel::from_score(self.classification.sentiment)
    }
}

/// Theme proposed by LLM discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredTheme {
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub business_relevance: BusinessRelevance,
}

/// Outcome counters of one Theme Assigner run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichRunSummary {
    pub processed: usize,
    pub skipped_no_comment: usize,
    pub failed: usize,
    pub discovered_themes: Vec<DiscoveredTheme>,
}

/// Enrichment coverage figures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentStats {
    pub total_responses: i64,
    pub responses_with_comments: i64,
    pub enriched_responses: i64,
    /// Enriched ÷ responses with comments, as a whole percentage.
    pub enrichment_percentage: i64,
    pub last_run: Option<DateTime<Utc>>,
}

// =============================================================================
// THEME MAPPING TYPES
// =============================================================================

/// Where a canonical mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Pattern,
    Ai,
    Fallback,
}

/// Canonical (main category, sub-category) pair for a raw theme label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeMapping {
    pub main_category: String,
    pub sub_category: String,
    pub confidence: f64,
    pub source: MatchSource,
}

// =============================================================================
// AGGREGATE TYPES
// =============================================================================

/// One mention: a (response, theme) assignment with the response facts the
/// Aggregator needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeAssignment {
    pub response_id: Uuid,
    pub theme: String,
    pub nps_score: i16,
    pub sentiment_score: Option<f64>,
    pub title_text: Option<String>,
    pub survey_name: String,
    pub creation_date: DateTime<Utc>,
    /// Free-text explanation of the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ThemeAssignment {
    /// Calendar month bucket, `YYYY-MM`.
    pub fn month(&self) -> String {
        self.creation_date.format("%Y-%m").to_string()
    }
}

/// Rolled-up statistics for one group of mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeAggregate {
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Mention count (assignment pairs, not distinct responses).
    pub count_responses: i64,
    /// Share of all mentions in the same context.
    pub share_pct: f64,
    pub avg_nps: f64,
    pub avg_sentiment: f64,
    pub promoters: i64,
    pub passives: i64,
    pub detractors: i64,
    pub pct_promoters: f64,
    pub pct_passives: f64,
    pub pct_detractors: f64,
    pub pct_pos_sentiment: f64,
    pub pct_neg_sentiment: f64,
}

/// Provenance of a theme shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSource {
    Base,
    Ai,
    Cluster,
}

/// Mention-volume relevance bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusinessRelevance {
    High,
    #[default]
    Medium,
    Low,
}

impl BusinessRelevance {
    pub fn from_mentions(mentions: i64) -> Self {
        if mentions >= HIGH_RELEVANCE_MENTIONS {
            Self::High
        } else if mentions < LOW_RELEVANCE_MENTIONS {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

/// A theme aggregate decorated for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSummary {
    #[serde(flatten)]
    pub aggregate: ThemeAggregate,
    pub source: ThemeSource,
    pub confidence: f64,
    pub explanation: String,
    pub business_relevance: BusinessRelevance,
}

/// A raw theme folded into the Other cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub theme: String,
    pub mentions: i64,
}

/// Headline KPI card values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpsKpis {
    pub total: i64,
    pub promoters: i64,
    pub passives: i64,
    pub detractors: i64,
    pub nps: f64,
    pub avg_score: f64,
}

/// NPS for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyNps {
    pub month: String,
    pub total: i64,
    pub promoters: i64,
    pub passives: i64,
    pub detractors: i64,
    pub nps: f64,
}

/// NPS for one survey or title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNps {
    pub name: String,
    pub total: i64,
    pub promoters: i64,
    pub passives: i64,
    pub detractors: i64,
    pub nps: f64,
}

/// NPS for one (title, month) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMonthNps {
    pub title: String,
    pub month: String,
    pub responses: i64,
    pub promoters: i64,
    pub detractors: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Month-over-month NPS change for a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMove {
    pub month: String,
    pub title: String,
    pub responses: i64,
    pub nps: f64,
    pub previous_nps: f64,
    pub mom_delta: f64,
    #[serde(rename = "move")]
    pub direction: MoveDirection,
}

/// Theme share in one month for a title, with the change from the prior month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeDriver {
    pub month: String,
    pub theme: String,
    pub count_responses: i64,
    pub share_pct: f64,
    pub mom_share_delta: Option<f64>,
}

/// Distinct values for the dashboard filter dropdowns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub surveys: Vec<String>,
    pub titles: Vec<String>,
}

/// Nearest-neighbour hit over enrichment embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarResponse {
    pub response_id: Uuid,
    pub title: Option<String>,
    pub survey_name: String,
    pub creation_date: DateTime<Utc>,
    pub nps_score: i16,
    pub comment: Option<String>,
    pub similarity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_bands() {
        assert_eq!(NpsCategory::from_score(10), NpsCategory::Promoter);
        assert_eq!(NpsCategory::from_score(9), NpsCategory::Promoter);
        assert_eq!(NpsCategory::from_score(8), NpsCategory::Passive);
        assert_eq!(NpsCategory::from_score(7), NpsCategory::Passive);
        assert_eq!(NpsCategory::from_score(6), NpsCategory::Detractor);
        assert_eq!(NpsCategory::from_score(0), NpsCategory::Detractor);
    }

    #[test]
    fn test_sentiment_label_thresholds() {
        assert_eq!(SentimentLabel::from_score(Some(0.5)), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(Some(0.1)), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(Some(-0.1)), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(Some(-0.4)), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(None), SentimentLabel::Neutral);
    }

    #[test]
    fn test_business_relevance_cutoffs() {
        assert_eq!(BusinessRelevance::from_mentions(100), BusinessRelevance::High);
        assert_eq!(BusinessRelevance::from_mentions(99), BusinessRelevance::Medium);
        assert_eq!(BusinessRelevance::from_mentions(10), BusinessRelevance::Medium);
        assert_eq!(BusinessRelevance::from_mentions(9), BusinessRelevance::Low);
    }

    #[test]
    fn test_theme_summary_flattens_aggregate() {
        let summary = ThemeSummary {
            aggregate: ThemeAggregate {
                theme: "pricing".into(),
                month: None,
                title: None,
                count_responses: 50,
                share_pct: 96.2,
                avg_nps: 5.4,
                avg_sentiment: -0.2,
                promoters: 5,
                passives: 10,
                detractors: 35,
                pct_promoters: 10.0,
                pct_passives: 20.0,
                pct_detractors: 70.0,
                pct_pos_sentiment: 8.0,
                pct_neg_sentiment: 60.0,
            },
            source: ThemeSource::Base,
            confidence: 1.0,
            explanation: "Predefined".into(),
            business_relevance: BusinessRelevance::Medium,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["theme"], "pricing");
        assert_eq!(json["count_responses"], 50);
        assert_eq!(json["source"], "base");
        assert!(json.get("month").is_none());
    }

    #[test]
    fn test_title_move_serializes_move_field() {
        let mv = TitleMove {
            month: "2024-03".into(),
            title: "X".into(),
            responses: 40,
            nps: 20.0,
            previous_nps: 5.0,
            mom_delta: 15.0,
            direction: MoveDirection::Up,
        };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["move"], "up");
    }
}
