//! Ad-hoc survey analysis models.
//!
//! An uploaded survey is a two-state job record: it is created `processing`,
//! gains a processed-response counter as work proceeds, and flips once to
//! `completed`. Themes and insights are regenerated wholesale on each run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::SentimentLabel;
use crate::defaults::NEUTRAL_SENTIMENT;

// =============================================================================
// SURVEY JOB
// =============================================================================

/// Lifecycle of an ad-hoc survey analysis. The only transition is
/// `Processing -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Processing,
    Completed,
}

impl SurveyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for SurveyStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            other => Err(crate::Error::Serialization(format!(
                "Unknown survey status: {}",
                other
            ))),
        }
    }
}

/// Stored survey analysis job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyAnalysis {
    pub id: Uuid,
    pub name: String,
    pub original_filename: String,
    pub total_responses: i32,
    pub processed_responses: i32,
    pub response_column: String,
    pub headers: Vec<String>,
    pub status: SurveyStatus,
    pub upload_date: DateTime<Utc>,
}

impl SurveyAnalysis {
    pub fn progress(&self) -> SurveyProgress {
        SurveyProgress::new(self.processed_responses, self.total_responses)
    }
}

/// Request to create a survey analysis with its responses.
#[derive(Debug, Clone)]
pub struct NewSurveyAnalysis {
    pub name: String,
    pub original_filename: String,
    pub response_column: String,
    pub headers: Vec<String>,
    pub responses: Vec<NewSurveyResponse>,
}

/// One uploaded row kept for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSurveyResponse {
    pub response_text: String,
    pub question_text: Option<String>,
    /// 1-based spreadsheet row (header is row 1).
    pub row_number: i32,
    pub participant_id: String,
    pub metadata: JsonValue,
}

/// Stored uploaded row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponseRow {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub response_text: String,
    pub question_text: Option<String>,
    pub row_number: i32,
    pub participant_id: String,
    pub metadata: JsonValue,
    pub ai_analysis: Option<JsonValue>,
}

/// Processed/total counter for polling clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyProgress {
    pub processed: i32,
    pub total: i32,
    /// Whole percentage, 0 when there is nothing to process.
    pub percentage: i32,
}

impl SurveyProgress {
    pub fn new(processed: i32, total: i32) -> Self {
        let percentage = if total > 0 {
            ((processed as f64 / total as f64) * 100.0).round() as i32
        } else {
            0
        };
        Self {
            processed,
            total,
            percentage: percentage.clamp(0, 100),
        }
    }
}

// =============================================================================
// ANALYSIS RESULTS
// =============================================================================

/// Classifier verdict for one ad-hoc response. Sentiment is on a 0..1 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    pub sentiment: SentimentLabel,
    pub sentiment_score: f64,
    pub themes: Vec<String>,
}

impl ResponseAnalysis {
    /// Substitute used when classification of a response fails.
    pub fn neutral() -> Self {
        Self {
            sentiment: SentimentLabel::Neutral,
            sentiment_score: NEUTRAL_SENTIMENT,
            themes: Vec::new(),
        }
    }
}

/// A response paired with its analysis, the Insight Renderer's input unit.
#[derive(Debug, Clone)]
pub struct AnalyzedResponse {
    pub response_id: Uuid,
    pub text: String,
    pub analysis: ResponseAnalysis,
}

/// Per-theme statistics stored for an ad-hoc survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyTheme {
    pub theme_name: String,
    pub mention_count: i32,
    pub sentiment_score: f64,
    pub sample_responses: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Summary,
    Theme,
    Recommendation,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Theme => "theme",
            Self::Recommendation => "recommendation",
        }
    }
}

impl std::str::FromStr for InsightType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "summary" => Ok(Self::Summary),
            "theme" => Ok(Self::Theme),
            "recommendation" => Ok(Self::Recommendation),
            other => Err(crate::Error::Serialization(format!(
                "Unknown insight type: {}",
                other
            ))),
        }
    }
}

/// Generated narrative record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub insight_type: InsightType,
    pub title: String,
    pub content: String,
    pub themes: Vec<String>,
    /// Impact in [0, 1].
    pub impact: f64,
}

impl Insight {
    /// Integer priority 0..10 used for ordering stored insights.
    pub fn priority(&self) -> i32 {
        (self.impact.clamp(0.0, 1.0) * 10.0).round() as i32
    }
}

/// Insight as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInsight {
    pub id: Uuid,
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub related_themes: Vec<String>,
    pub impact_score: f64,
}

/// LLM-proposed refinement of one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTheme {
    pub sub_theme: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub sample_quote: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResults {
    pub themes: Vec<SurveyTheme>,
    pub insights: Vec<StoredInsight>,
}

/// Polling payload of the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyStatusReport {
    pub survey: SurveyAnalysis,
    pub progress: SurveyProgress,
    pub results: SurveyResults,
}

/// Full payload of the details endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyDetails {
    pub survey: SurveyAnalysis,
    pub themes: Vec<SurveyTheme>,
    pub insights: Vec<StoredInsight>,
    pub sample_responses: Vec<SurveyResponseRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage_rounds() {
        let p = SurveyProgress::new(1, 3);
        assert_eq!(p.percentage, 33);
        assert_eq!(SurveyProgress::new(2, 3).percentage, 67);
    }

    #[test]
    fn test_progress_zero_total() {
        assert_eq!(SurveyProgress::new(0, 0).percentage, 0);
    }

    #[test]
    fn test_insight_priority() {
        let insight = Insight {
            insight_type: InsightType::Summary,
            title: "t".into(),
            content: "c".into(),
            themes: vec![],
            impact: 0.75,
        };
        assert_eq!(insight.priority(), 8);
    }

    #[test]
    fn test_status_round_trip_str() {
        assert_eq!(
            "processing".parse::<SurveyStatus>().unwrap(),
            SurveyStatus::Processing
        );
        assert_eq!(SurveyStatus::Completed.as_str(), "completed");
        assert!("failed".parse::<SurveyStatus>().is_err());
    }

    #[test]
    fn test_neutral_analysis() {
        let a = ResponseAnalysis::neutral();
        assert_eq!(a.sentiment, SentimentLabel::Neutral);
        assert_eq!(a.sentiment_score, 0.5);
        assert!(a.themes.is_empty());
    }

    #[test]
    fn test_sub_theme_camel_case() {
        let json = r#"{"subTheme":"late courier","description":"d","percentage":40,"sampleQuote":"q","recommendation":"r"}"#;
        let sub: SubTheme = serde_json::from_str(json).unwrap();
        assert_eq!(sub.sub_theme, "late courier");
        assert_eq!(sub.percentage, 40.0);
    }
}
