//! Prompts and reply validation for the ad-hoc survey analysis tool.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use nps_core::defaults::{ANALYSIS_TEMPERATURE, SUB_THEME_MAX_TOKENS, SUB_THEME_SAMPLE_SIZE};
use nps_core::{
    Error, GenerationBackend, GenerationOptions, ResponseAnalysis, Result, SentimentLabel, SubTheme,
};

use crate::salvage;

pub const ANALYSIS_SYSTEM: &str = r#"Analyze this survey response and extract:
1. Sentiment: Be decisive - if the response expresses satisfaction, praise, or positive emotions, classify as "positive". If it expresses dissatisfaction, complaints, or negative emotions, classify as "negative". Only use "neutral" for truly neutral statements.
2. Main themes: Extract 2-3 key themes that represent the MAIN TOPICS or ISSUES discussed. Focus on the core subject matter, not descriptive words. For example:
   - If someone says "shipping was too expensive for a small item" → theme should be "shipping cost" or "delivery pricing", not "small item"
   - If someone says "love the new interface" → theme should be "user interface" or "usability", not "new"
   - If someone says "customer support was amazing" → theme should be "customer service" or "support quality"

Return JSON format:
{
  "sentiment": "positive|negative|neutral",
  "sentiment_score": 0.8,
  "themes": ["theme1", "theme2"]
}"#;

pub const SUB_THEME_SYSTEM: &str = "You are an expert in analyzing customer feedback for media companies. Focus on identifying specific, actionable sub-themes that can help editorial teams improve their content. Always respond in Dutch.";

/// Validate a per-response analysis reply.
///
/// The reply must be an object with a known `sentiment` label, a numeric
/// `sentiment_score` and a `themes` array; anything else is a
/// classification failure.
pub fn parse_response_analysis(text: &str) -> Result<ResponseAnalysis> {
    let invalid = || Error::Classification("Invalid AI analysis structure".to_string());

    let Some(Value::Object(obj)) = salvage::parse_strict(text) else {
        return Err(invalid());
    };
    let sentiment: SentimentLabel = obj
        .get("sentiment")
        .and_then(Value::as_str)
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;
    let score = obj
        .get("sentiment_score")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite())
        .ok_or_else(invalid)?;
    let Some(Value::Array(raw_themes)) = obj.get("themes") else {
        return Err(invalid());
    };

    let mut themes: Vec<String> = Vec::new();
    for theme in raw_themes.iter().filter_map(Value::as_str) {
        let theme = theme.trim().to_lowercase();
        if !theme.is_empty() && !themes.contains(&theme) {
            themes.push(theme);
        }
    }

    Ok(ResponseAnalysis {
        sentiment,
        sentiment_score: score.clamp(0.0, 1.0),
        themes,
    })
}

pub fn build_sub_theme_prompt(theme: &str, responses: &[String]) -> String {
    let sample = responses
        .iter()
        .take(SUB_THEME_SAMPLE_SIZE)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        r#"Analyze these customer feedback responses about "{theme}" and identify specific sub-themes or patterns in what customers are complaining about or praising.

Responses to analyze:
{sample}

Please identify 3-5 specific sub-themes within "{theme}" and provide:
1. Sub-theme name (in Dutch)
2. Brief description of what this sub-theme covers
3. Percentage estimate of how common this sub-theme is
4. Sample quote that represents this sub-theme
5. Specific actionable recommendation for this sub-theme

Return as JSON array with this structure:
[
  {{
    "subTheme": "sub-theme name in Dutch",
    "description": "brief description",
    "percentage": 25,
    "sampleQuote": "example customer quote",
    "recommendation": "specific actionable recommendation in Dutch"
  }}
]"#
    )
}

/// Sub-theme replies must be a JSON array of sub-theme objects.
pub fn parse_sub_themes(text: &str) -> Result<Vec<SubTheme>> {
    match salvage::parse_strict(text) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<SubTheme>(item)
                    .map_err(|e| Error::Classification(format!("Invalid sub-theme: {}", e)))
            })
            .collect(),
        Some(_) => Err(Error::Classification("Response is not an array".to_string())),
        None => Err(Error::Classification(
            "Invalid JSON response from model".to_string(),
        )),
    }
}

/// LLM calls of the ad-hoc survey tool.
#[derive(Clone)]
pub struct SurveyAnalyzer {
    backend: Arc<dyn GenerationBackend>,
}

impl SurveyAnalyzer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Sentiment and themes of one free-text answer.
    pub async fn analyze_response(&self, text: &str) -> Result<ResponseAnalysis> {
        let reply = self
            .backend
            .generate_with_options(
                ANALYSIS_SYSTEM,
                text,
                &GenerationOptions::json(ANALYSIS_TEMPERATURE),
            )
            .await?;
        parse_response_analysis(&reply)
    }

    /// Break one theme into sub-themes using a sample of its responses.
    pub async fn discover_sub_themes(
        &self,
        theme: &str,
        responses: &[String],
    ) -> Result<Vec<SubTheme>> {
        if theme.trim().is_empty() || responses.is_empty() {
            return Err(Error::InvalidInput(
                "Theme and responses are required".to_string(),
            ));
        }
        let prompt = build_sub_theme_prompt(theme, responses);
        let options =
            GenerationOptions::text(ANALYSIS_TEMPERATURE).with_max_tokens(SUB_THEME_MAX_TOKENS);
        let reply = self
            .backend
            .generate_with_options(SUB_THEME_SYSTEM, &prompt, &options)
            .await?;
        if reply.trim().is_empty() {
            return Err(Error::Inference("No response from model".to_string()));
        }
        let sub_themes = parse_sub_themes(&reply)?;
        debug!(
            subsystem = "inference",
            component = "sub_themes",
            theme = theme,
            result_count = sub_themes.len(),
            "Sub-themes discovered"
        );
        Ok(sub_themes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_analysis() {
        let reply = r#"{"sentiment":"Negative","sentiment_score":0.15,"themes":["Shipping Cost","shipping cost"," "]}"#;
        let analysis = parse_response_analysis(reply).unwrap();
        assert_eq!(analysis.sentiment, SentimentLabel::Negative);
        assert_eq!(analysis.sentiment_score, 0.15);
        assert_eq!(analysis.themes, vec!["shipping cost"]);
    }

    #[test]
    fn test_parse_clamps_score() {
        let reply = r#"{"sentiment":"positive","sentiment_score":4,"themes":[]}"#;
        assert_eq!(parse_response_analysis(reply).unwrap().sentiment_score, 1.0);
    }

    #[test]
    fn test_parse_rejects_incomplete_structure() {
        for reply in [
            r#"{"sentiment":"positive","themes":["x"]}"#,
            r#"{"sentiment":"happy","sentiment_score":0.9,"themes":["x"]}"#,
            r#"{"sentiment":"positive","sentiment_score":0.9}"#,
            r#"["positive"]"#,
            "not json",
        ] {
            let err = parse_response_analysis(reply).unwrap_err();
            assert!(matches!(err, Error::Classification(_)), "{}", reply);
        }
    }

    #[test]
    fn test_sub_theme_prompt_uses_first_twenty() {
        let responses: Vec<String> = (0..30).map(|i| format!("antwoord-{:02}", i)).collect();
        let prompt = build_sub_theme_prompt("bezorging", &responses);
        assert!(prompt.contains("about \"bezorging\""));
        assert!(prompt.contains("antwoord-19"));
        assert!(!prompt.contains("antwoord-20"));
    }

    #[test]
    fn test_parse_sub_themes() {
        let reply = r#"[{"subTheme":"Late bezorging","description":"Krant komt na 7 uur","percentage":40,"sampleQuote":"Altijd te laat","recommendation":"Bezorgroutes herzien"}]"#;
        let subs = parse_sub_themes(reply).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].sub_theme, "Late bezorging");
        assert_eq!(subs[0].percentage, 40.0);
    }

    #[test]
    fn test_parse_sub_themes_rejects_object() {
        let err = parse_sub_themes(r#"{"subTheme":"x"}"#).unwrap_err();
        assert!(err.to_string().contains("not an array"));
    }
}
