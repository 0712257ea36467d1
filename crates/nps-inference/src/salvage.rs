//! Defensive parsing of LLM output.
//!
//! Model replies are untrusted. Callers try a strict parse first, then pull
//! the first JSON array out of surrounding prose, and finally scrape quoted
//! snake_case names line by line.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// How a model reply was turned into data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    /// The reply was valid JSON of the expected shape.
    Strict,
    /// A JSON array was recovered from surrounding text.
    Salvage,
    /// Names were scraped from quoted tokens.
    Scrape,
    /// Nothing usable; defaults were applied.
    Fallback,
}

impl ParsePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Salvage => "salvage",
            Self::Scrape => "scrape",
            Self::Fallback => "fallback",
        }
    }
}

/// Object keys that show up quoted in replies but are never theme names.
const SCHEMA_KEYS: &[&str] = &[
    "name",
    "confidence",
    "explanation",
    "themes",
    "theme_scores",
    "sentiment",
    "keywords",
    "language",
    "high",
    "medium",
    "low",
    "nl",
];

static QUOTED_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([a-z_]+)""#).unwrap());

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse the reply as a single JSON value.
pub fn parse_strict(text: &str) -> Option<Value> {
    serde_json::from_str(strip_code_fence(text)).ok()
}

/// Recover the first JSON array embedded in free text.
///
/// Every `[` is a candidate start. The first one that opens a complete
/// JSON array wins; bracketed prose before it and text after it are ignored.
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(items))) => Some(items),
            _ => None,
        }
    })
}

/// First quoted lowercase snake_case token on each line, deduplicated.
pub fn scrape_quoted_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in text.lines() {
        let found = QUOTED_NAME
            .captures_iter(line)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|s| !SCHEMA_KEYS.contains(s));
        if let Some(name) = found {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Array reply with the salvage ladder applied.
///
/// Returns the items and the path taken. Scraped names become
/// `{"name": ..}` objects without a confidence so callers can apply their
/// own default.
pub fn parse_array(text: &str) -> (Vec<Value>, ParsePath) {
    if let Some(Value::Array(items)) = parse_strict(text) {
        return (items, ParsePath::Strict);
    }
    if let Some(items) = extract_json_array(text) {
        return (items, ParsePath::Salvage);
    }
    let names = scrape_quoted_names(text);
    if names.is_empty() {
        return (Vec::new(), ParsePath::Fallback);
    }
    let items = names
        .into_iter()
        .map(|n| serde_json::json!({ "name": n }))
        .collect();
    (items, ParsePath::Scrape)
}
