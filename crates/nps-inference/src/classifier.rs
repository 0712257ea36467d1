//! Per-response NPS theme classifier.
//!
//! The model is asked for a strict JSON object
//! `{themes, theme_scores, sentiment, keywords, language}` over a fixed Dutch
//! taxonomy. Whatever comes back is validated field by field; a reply that
//! cannot be read at all still yields a usable [`Classification`] with the
//! single fallback theme.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use nps_core::defaults::{CLASSIFY_TEMPERATURE, FALLBACK_THEME};
use nps_core::{
    Classification, DiscoveredTheme, GenerationBackend, GenerationOptions, NpsResponse, Result,
};

use crate::salvage::{self, ParsePath};

/// Fixed theme labels the classifier may choose from.
pub const THEME_TAXONOMY: &[&str] = &[
    "pricing",
    "bezorging",
    "content_kwaliteit",
    "klantenservice",
    "app_ux",
    "aboflexibiliteit",
    "merkvertrouwen",
    "overige",
];

pub const CLASSIFY_SYSTEM_NL: &str = "Je bent een NL-analist voor NPS-feedback van nieuws/magazine abonnementen.\n\
Label Nederlandse opmerkingen volgens vaste thema's en geef sentiment.\n\
Antwoord uitsluitend met geldige JSON, zonder extra tekst.";

/// Base taxonomy extended with discovered theme names, without duplicates.
pub fn extended_taxonomy(discovered: &[DiscoveredTheme]) -> Vec<String> {
    let mut labels: Vec<String> = THEME_TAXONOMY.iter().map(|s| s.to_string()).collect();
    for theme in discovered {
        if !labels.iter().any(|l| l == &theme.name) {
            labels.push(theme.name.clone());
        }
    }
    labels
}

/// User prompt for one response.
pub fn build_classify_prompt(response: &NpsResponse, taxonomy: &[String]) -> String {
    let comment = response.nps_explanation.as_deref().unwrap_or("");
    format!(
        r#"Context:
- SurveyType: {survey}
- NPS: {score}
- Titel: {title}
- Opmerking: """{comment}"""

Taxonomie (kies uitsluitend uit deze labels):
- {labels}

JSON schema (exact):
{{
  "themes": ["<label>", ...],
  "theme_scores": {{"<label>": <0..1>, ...}},
  "sentiment": <float between -1 and 1 or null>,
  "keywords": ["...", "..."],
  "language": "nl"
}}

Regels:
- Bij lege/n.v.t.-opmerking: themes=["overige"], sentiment=null, keywords=[].
- Houd het beknopt en valide."#,
        survey = if response.survey_name.is_empty() {
            "-"
        } else {
            response.survey_name.as_str()
        },
        score = response.nps_score,
        title = response.title_text.as_deref().unwrap_or("-"),
        comment = comment,
        labels = taxonomy.join(", "),
    )
}

/// Classification used when nothing could be read from the reply.
pub fn fallback_classification() -> Classification {
    Classification {
        themes: vec![FALLBACK_THEME.to_string()],
        theme_scores: BTreeMap::new(),
        sentiment: None,
        keywords: Vec::new(),
        language: "nl".to_string(),
    }
}

fn normalize_label(raw: &str) -> Option<String> {
    let label = raw.trim().to_lowercase();
    (!label.is_empty()).then_some(label)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = value {
        for item in items {
            if let Some(label) = item.as_str().and_then(normalize_label) {
                if !out.contains(&label) {
                    out.push(label);
                }
            }
        }
    }
    out
}

fn score_map(value: Option<&Value>) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    if let Some(Value::Object(map)) = value {
        for (k, v) in map {
            if let (Some(label), Some(score)) = (normalize_label(k), v.as_f64()) {
                out.insert(label, score.clamp(0.0, 1.0));
            }
        }
    }
    out
}

fn from_object(obj: &Map<String, Value>) -> Classification {
    let mut themes = string_list(obj.get("themes"));
    if themes.is_empty() {
        themes.push(FALLBACK_THEME.to_string());
    }
    Classification {
        themes,
        theme_scores: score_map(obj.get("theme_scores")),
        sentiment: obj
            .get("sentiment")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(-1.0, 1.0)),
        keywords: string_list(obj.get("keywords")),
        language: obj
            .get("language")
            .and_then(Value::as_str)
            .and_then(normalize_label)
            .unwrap_or_else(|| "nl".to_string()),
    }
}

/// Themes from a bare array of labels or `{name, confidence}` objects.
fn from_items(items: &[Value]) -> Option<Classification> {
    let mut classification = fallback_classification();
    classification.themes.clear();
    for item in items {
        let (name, confidence) = match item {
            Value::String(s) => (normalize_label(s), None),
            Value::Object(o) => (
                o.get("name").and_then(Value::as_str).and_then(normalize_label),
                o.get("confidence").and_then(Value::as_f64),
            ),
            _ => (None, None),
        };
        let Some(name) = name else { continue };
        if let Some(c) = confidence {
            classification.theme_scores.insert(name.clone(), c.clamp(0.0, 1.0));
        }
        if !classification.themes.contains(&name) {
            classification.themes.push(name);
        }
    }
    (!classification.themes.is_empty()).then_some(classification)
}

/// Validate a raw classifier reply.
///
/// Never fails: unusable replies resolve to [`fallback_classification`] with
/// [`ParsePath::Fallback`].
pub fn parse_classification(text: &str) -> (Classification, ParsePath) {
    match salvage::parse_strict(text) {
        Some(Value::Object(obj)) => return (from_object(&obj), ParsePath::Strict),
        Some(Value::Array(items)) => {
            if let Some(c) = from_items(&items) {
                return (c, ParsePath::Strict);
            }
        }
        _ => {}
    }
    if let Some(c) = salvage::extract_json_array(text).and_then(|items| from_items(&items)) {
        return (c, ParsePath::Salvage);
    }
    (fallback_classification(), ParsePath::Fallback)
}

/// Classifies single NPS comments against the taxonomy.
#[derive(Clone)]
pub struct ResponseClassifier {
    backend: Arc<dyn GenerationBackend>,
    taxonomy: Vec<String>,
}

impl ResponseClassifier {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            taxonomy: extended_taxonomy(&[]),
        }
    }

    /// Allow the discovered themes as additional labels.
    pub fn with_discovered(mut self, discovered: &[DiscoveredTheme]) -> Self {
        self.taxonomy = extended_taxonomy(discovered);
        self
    }

    pub fn taxonomy(&self) -> &[String] {
        &self.taxonomy
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Classify one response.
    ///
    /// Errors only when the model call itself fails; malformed output is
    /// salvaged or defaulted. The returned path tells the caller which.
    pub async fn classify(&self, response: &NpsResponse) -> Result<(Classification, ParsePath)> {
        let start = Instant::now();
        let prompt = build_classify_prompt(response, &self.taxonomy);
        let reply = self
            .backend
            .generate_with_options(
                CLASSIFY_SYSTEM_NL,
                &prompt,
                &GenerationOptions::json(CLASSIFY_TEMPERATURE),
            )
            .await?;

        let (classification, path) = parse_classification(&reply);
        if path == ParsePath::Fallback {
            warn!(
                subsystem = "inference",
                component = "classifier",
                response_id = %response.id,
                parse_path = path.as_str(),
                response_len = reply.len(),
                "Classifier reply unusable, assigning fallback theme"
            );
        } else {
            debug!(
                subsystem = "inference",
                component = "classifier",
                op = "classify",
                response_id = %response.id,
                parse_path = path.as_str(),
                themes = ?classification.themes,
                duration_ms = start.elapsed().as_millis() as u64,
                "Response classified"
            );
        }
        Ok((classification, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn response(comment: Option<&str>) -> NpsResponse {
        NpsResponse {
            id: Uuid::new_v4(),
            nps_score: 4,
            nps_explanation: comment.map(str::to_string),
            title_text: Some("Dagblad".to_string()),
            survey_name: "Opzegging".to_string(),
            creation_date: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_contains_context_and_taxonomy() {
        let prompt = build_classify_prompt(
            &response(Some("Krant komt te laat")),
            &extended_taxonomy(&[]),
        );
        assert!(prompt.contains("- SurveyType: Opzegging"));
        assert!(prompt.contains("- NPS: 4"));
        assert!(prompt.contains("- Titel: Dagblad"));
        assert!(prompt.contains(r#"- Opmerking: """Krant komt te laat""""#));
        assert!(prompt.contains("pricing, bezorging, content_kwaliteit"));
        assert!(prompt.contains("\"language\": \"nl\""));
    }

    #[test]
    fn test_extended_taxonomy_skips_duplicates() {
        let discovered = vec![
            DiscoveredTheme {
                name: "mobiele_app".to_string(),
                confidence: 0.8,
                explanation: String::new(),
                business_relevance: Default::default(),
            },
            DiscoveredTheme {
                name: "pricing".to_string(),
                confidence: 0.8,
                explanation: String::new(),
                business_relevance: Default::default(),
            },
        ];
        let labels = extended_taxonomy(&discovered);
        assert_eq!(labels.len(), THEME_TAXONOMY.len() + 1);
        assert_eq!(labels.last().map(String::as_str), Some("mobiele_app"));
    }

    #[test]
    fn test_parse_valid_object_clamps_values() {
        let reply = r#"{
            "themes": ["Bezorging", "pricing", "bezorging"],
            "theme_scores": {"bezorging": 1.4, "pricing": -0.2},
            "sentiment": -1.8,
            "keywords": ["te laat"],
            "language": "nl"
        }"#;
        let (c, path) = parse_classification(reply);
        assert_eq!(path, ParsePath::Strict);
        assert_eq!(c.themes, vec!["bezorging", "pricing"]);
        assert_eq!(c.theme_scores["bezorging"], 1.0);
        assert_eq!(c.theme_scores["pricing"], 0.0);
        assert_eq!(c.sentiment, Some(-1.0));
        assert_eq!(c.keywords, vec!["te laat"]);
    }

    #[test]
    fn test_parse_missing_fields_default() {
        let (c, path) = parse_classification(r#"{"sentiment": null}"#);
        assert_eq!(path, ParsePath::Strict);
        assert_eq!(c.themes, vec!["overige"]);
        assert!(c.theme_scores.is_empty());
        assert!(c.keywords.is_empty());
        assert_eq!(c.sentiment, None);
        assert_eq!(c.language, "nl");
    }

    #[test]
    fn test_parse_salvages_embedded_array() {
        let reply = r#"Thema's: [{"name":"levering","confidence":0.7}] (einde"#;
        let (c, path) = parse_classification(reply);
        assert_eq!(path, ParsePath::Salvage);
        assert_eq!(c.themes, vec!["levering"]);
        assert_eq!(c.theme_scores["levering"], 0.7);
        assert_eq!(c.sentiment, None);
    }

    #[test]
    fn test_parse_total_failure_falls_back() {
        let (c, path) = parse_classification("Ik weet het niet.");
        assert_eq!(path, ParsePath::Fallback);
        assert_eq!(c, fallback_classification());
    }
}
