//! LLM theme discovery over a sample of comments.
//!
//! Proposes a handful of new snake_case themes that the base business
//! categories do not cover yet.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

use nps_core::defaults::{
    DISCOVERY_MAX_THEMES, DISCOVERY_MAX_TOKENS, DISCOVERY_MIN_COMMENT_CHARS, DISCOVERY_SAMPLE_SIZE,
    DISCOVERY_TEMPERATURE,
};
use nps_core::{BusinessRelevance, DiscoveredTheme, GenerationBackend, GenerationOptions, Result};

use crate::salvage::{self, ParsePath};

pub use nps_core::defaults::BASE_THEMES;

/// Confidence given to themes recovered outside the strict path.
const SALVAGED_CONFIDENCE: f64 = 0.7;

const DEFAULT_EXPLANATION: &str = "AI-discovered theme from customer feedback";

pub const DISCOVERY_SYSTEM: &str = "Je bent een expert in het analyseren van Nederlandse klantfeedback. Geef ALTIJD alleen geldige JSON terug in dit exacte format: [{\"name\": \"thema_naam\", \"confidence\": 0.8, \"explanation\": \"uitleg\", \"businessRelevance\": \"high\"}]. Geen andere tekst.";

/// Comments worth showing to the model: longer than the minimum, capped.
pub fn sample_for_discovery(comments: &[String]) -> Vec<&str> {
    comments
        .iter()
        .map(|c| c.trim())
        .filter(|c| c.chars().count() > DISCOVERY_MIN_COMMENT_CHARS)
        .take(DISCOVERY_SAMPLE_SIZE)
        .collect()
}

pub fn build_discovery_prompt(comments: &[&str]) -> String {
    format!(
        r#"Je bent een expert in het analyseren van Nederlandse klantfeedback voor een mediabedrijf (kranten/nieuws).

Analyseer de volgende klantfeedback en ontdek 3-5 nieuwe thema's die NIET in de bestaande categorieën zitten:
Bestaande categorieën: {existing}

Focus op:
- Business-relevante thema's (dingen die het bedrijf kan verbeteren)
- Specifieke thema's (niet te breed zoals "service")
- Actiegerichte thema's (wat klanten echt belangrijk vinden)

Feedback voor analyse:
{feedback}

Geef voor elk nieuw thema:
1. Thema naam (1-3 woorden, in het Nederlands, snake_case)
2. Vertrouwen (0-1)
3. Uitleg waarom dit thema belangrijk is
4. Business relevantie (high/medium/low)

Format: JSON array met objecten {{name, confidence, explanation, businessRelevance}}

Voorbeelden van goede thema's:
- "abonnement_beheer" (klanten hebben problemen met abonnementen)
- "mobiele_app" (klachten over de mobiele app)
- "nieuws_actualiteit" (feedback over nieuwswaarde)
- "klantenservice" (ervaringen met klantenservice)

Geef alleen JSON terug, geen andere tekst."#,
        existing = BASE_THEMES.join(", "),
        feedback = comments.join("\n\n"),
    )
}

fn normalize_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn parse_relevance(value: Option<&Value>) -> BusinessRelevance {
    match value.and_then(Value::as_str).map(str::to_lowercase).as_deref() {
        Some("high") => BusinessRelevance::High,
        Some("low") => BusinessRelevance::Low,
        _ => BusinessRelevance::Medium,
    }
}

/// Turn parsed items into validated themes.
///
/// Strict replies must carry a name and a confidence; salvaged items only need
/// a name. Names colliding with [`BASE_THEMES`] or with each other are dropped.
pub fn validate_themes(items: &[Value], path: ParsePath) -> Vec<DiscoveredTheme> {
    let mut themes: Vec<DiscoveredTheme> = Vec::new();
    for item in items {
        let Value::Object(obj) = item else { continue };
        let Some(name) = obj
            .get("name")
            .and_then(Value::as_str)
            .map(normalize_name)
            .filter(|n| !n.is_empty())
        else {
            continue;
        };
        let confidence = match (obj.get("confidence").and_then(Value::as_f64), path) {
            (Some(c), _) if c.is_finite() => c.clamp(0.0, 1.0),
            (_, ParsePath::Strict) => continue,
            _ => SALVAGED_CONFIDENCE,
        };
        if BASE_THEMES.contains(&name.as_str()) || themes.iter().any(|t| t.name == name) {
            continue;
        }
        let explanation = obj
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXPLANATION)
            .to_string();
        themes.push(DiscoveredTheme {
            name,
            confidence,
            explanation,
            business_relevance: parse_relevance(obj.get("businessRelevance")),
        });
    }
    themes.truncate(DISCOVERY_MAX_THEMES);
    themes
}

/// Runs discovery calls against a generation backend.
#[derive(Clone)]
pub struct ThemeDiscovery {
    backend: Arc<dyn GenerationBackend>,
}

impl ThemeDiscovery {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Discover new themes in the given comments.
    ///
    /// Returns an empty list without calling the model when no comment is long
    /// enough. Model call failures propagate.
    pub async fn discover(&self, comments: &[String]) -> Result<Vec<DiscoveredTheme>> {
        let sample = sample_for_discovery(comments);
        if sample.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let prompt = build_discovery_prompt(&sample);
        let options =
            GenerationOptions::text(DISCOVERY_TEMPERATURE).with_max_tokens(DISCOVERY_MAX_TOKENS);
        let reply = self
            .backend
            .generate_with_options(DISCOVERY_SYSTEM, &prompt, &options)
            .await?;

        let (items, path) = salvage::parse_array(&reply);
        if path != ParsePath::Strict {
            warn!(
                subsystem = "inference",
                component = "discovery",
                parse_path = path.as_str(),
                response_len = reply.len(),
                "Discovery reply was not a clean JSON array"
            );
        }
        let themes = validate_themes(&items, path);

        info!(
            subsystem = "inference",
            component = "discovery",
            op = "discover",
            model = self.backend.model_name(),
            sample_size = sample.len(),
            result_count = themes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Theme discovery complete"
        );
        Ok(themes)
    }
}
