//! Display decoration for theme aggregates: provenance, confidence,
//! explanation text and business relevance.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use nps_core::defaults::{
    AI_THEME_CONFIDENCE, BASE_THEMES, BASE_THEME_CONFIDENCE, EXPLANATION_KEYWORDS,
    EXPLANATION_MIN_WORD_LEN, OTHER_CLUSTER_MIN_MENTIONS, OTHER_CLUSTER_NAME,
};
use nps_core::{BusinessRelevance, ThemeAggregate, ThemeAssignment, ThemeSource, ThemeSummary};

/// Responses sampled per theme for keyword extraction.
const KEYWORD_SAMPLE_RESPONSES: usize = 5;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

static STOP_WORDS: &[&str] = &[
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "its", "may", "new", "now", "old",
    "see", "two", "way", "who", "boy", "did", "man", "oil", "sit", "try", "use", "why", "let",
    "put", "say", "she", "too",
    // Dutch
    "een", "van", "het", "aan", "met", "voor", "dat", "niet", "zijn", "als", "maar", "dan", "ook",
    "nog", "over", "heeft", "hebben", "wordt", "worden", "kan", "kunnen", "moet", "moeten", "zal",
    "zullen", "zou", "zouden", "heb", "hadden", "waren", "ben", "bent", "dit", "die", "deze",
    "wel", "geen", "alle", "alleen", "altijd", "weer", "meer", "veel", "weinig", "groot", "klein",
    "goed", "slecht", "nieuw", "oud", "jong", "laat", "vroeg", "lang", "kort", "hoog", "laag",
    "breed", "smal", "dik", "dun", "warm", "koud", "hete", "koude", "nat", "droog", "schoon",
    "vuil", "mooi", "lelijk", "leuk", "saai", "interessant", "belangrijk", "nuttig", "handig",
    "makkelijk", "moeilijk", "duur", "goedkoop", "snel", "langzaam", "sterk", "zwak", "zwaar",
    "licht", "vol", "leeg", "open", "dicht", "binnen", "buiten", "boven", "onder", "links",
    "rechts", "achter", "naast", "tussen", "door", "rond", "naar", "tot", "sinds", "tijdens",
    "tijd", "uur", "dag", "week", "maand", "jaar", "morgen", "gisteren", "vandaag", "avond",
    "ochtend", "middag", "nacht",
];

/// Theme name with its first underscore shown as a space.
fn display_name(theme: &str) -> String {
    theme.replacen('_', " ", 1)
}

/// Most frequent content words across `comments`, first occurrence breaking ties.
pub fn extract_keywords<'a>(comments: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut freq: HashMap<String, usize> = HashMap::new();
    for comment in comments {
        let lower = comment.to_lowercase();
        for word in WORD.find_iter(&lower).map(|m| m.as_str()) {
            if word.chars().count() < EXPLANATION_MIN_WORD_LEN || STOP_WORDS.contains(&word) {
                continue;
            }
            let count = freq.entry(word.to_string()).or_default();
            if *count == 0 {
                order.push(word.to_string());
            }
            *count += 1;
        }
    }
    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| freq[b].cmp(&freq[a]));
    order.truncate(EXPLANATION_KEYWORDS);
    order
}

pub fn cluster_explanation() -> String {
    format!(
        "Cluster of themes with fewer than {} mentions each",
        OTHER_CLUSTER_MIN_MENTIONS
    )
}

pub fn base_explanation(theme: &str) -> String {
    format!("Predefined business category for {} feedback", display_name(theme))
}

pub fn ai_explanation(theme: &str, keywords: &[String]) -> String {
    let basis = if keywords.is_empty() {
        " based on common patterns in customer feedback".to_string()
    } else {
        format!(" based on keywords like \"{}\"", keywords.join("\", \""))
    };
    format!(
        "AI-discovered theme from customer feedback analysis{}. This theme emerged from multiple responses indicating {} as a key concern.",
        basis,
        display_name(theme)
    )
}

pub fn theme_source(theme: &str) -> ThemeSource {
    if theme == OTHER_CLUSTER_NAME {
        ThemeSource::Cluster
    } else if BASE_THEMES.contains(&theme) {
        ThemeSource::Base
    } else {
        ThemeSource::Ai
    }
}

/// Decorate aggregates. `assignments` supplies comment text for AI-theme
/// keyword digests and should be the pre-collapse pairs of the same context.
pub fn summarize(aggregates: Vec<ThemeAggregate>, assignments: &[ThemeAssignment]) -> Vec<ThemeSummary> {
    aggregates
        .into_iter()
        .map(|aggregate| {
            let source = theme_source(&aggregate.theme);
            let explanation = match source {
                ThemeSource::Cluster => cluster_explanation(),
                ThemeSource::Base => base_explanation(&aggregate.theme),
                ThemeSource::Ai => {
                    let comments = assignments
                        .iter()
                        .filter(|a| a.theme == aggregate.theme)
                        .filter_map(|a| a.comment.as_deref())
                        .take(KEYWORD_SAMPLE_RESPONSES);
                    ai_explanation(&aggregate.theme, &extract_keywords(comments))
                }
            };
            ThemeSummary {
                confidence: if source == ThemeSource::Base {
                    BASE_THEME_CONFIDENCE
                } else {
                    AI_THEME_CONFIDENCE
                },
                business_relevance: BusinessRelevance::from_mentions(aggregate.count_responses),
                source,
                explanation,
                aggregate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_support::mentions;
    use crate::aggregate::{aggregate, GroupKey, SortOrder};
    use crate::cluster::collapse_default;

    #[test]
    fn test_base_explanation_replaces_first_underscore() {
        assert_eq!(
            base_explanation("content_kwaliteit"),
            "Predefined business category for content kwaliteit feedback"
        );
    }

    #[test]
    fn test_keywords_skip_stop_words_and_short_words() {
        let keywords = extract_keywords([
            "De app is traag en de app crasht",
            "Voor een app betaal ik te veel",
        ]);
        assert_eq!(keywords[0], "app");
        assert!(keywords.contains(&"traag".to_string()));
        assert!(!keywords.iter().any(|k| k == "voor" || k == "de" || k == "een"));
        assert!(keywords.len() <= EXPLANATION_KEYWORDS);
    }

    #[test]
    fn test_ai_explanation_text() {
        assert_eq!(
            ai_explanation("mobiele_app_crash", &["app".to_string(), "traag".to_string()]),
            "AI-discovered theme from customer feedback analysis based on keywords like \"app\", \"traag\". This theme emerged from multiple responses indicating mobiele app_crash as a key concern."
        );
        assert!(ai_explanation("x", &[]).contains(" based on common patterns in customer feedback."));
    }

    #[test]
    fn test_summaries_carry_source_and_relevance() {
        let mut assignments = mentions("pricing", 120, 8);
        let mut ai = mentions("mobiele_app", 12, 3);
        for a in ai.iter_mut() {
            a.comment = Some("De mobiele app crasht".to_string());
        }
        assignments.extend(ai);
        assignments.extend(mentions("zeldzaam", 1, 5));

        let (collapsed, _) = collapse_default(assignments.clone());
        let groups = aggregate(&collapsed, GroupKey::Theme, SortOrder::ByCount);
        let summaries = summarize(groups, &assignments);

        assert_eq!(summaries[0].source, ThemeSource::Base);
        assert_eq!(summaries[0].confidence, 1.0);
        assert_eq!(summaries[0].business_relevance, BusinessRelevance::High);

        assert_eq!(summaries[1].source, ThemeSource::Ai);
        assert_eq!(summaries[1].confidence, 0.8);
        assert_eq!(summaries[1].business_relevance, BusinessRelevance::Medium);
        assert!(summaries[1].explanation.contains("\"mobiele\", \"app\", \"crasht\""));

        assert_eq!(summaries[2].source, ThemeSource::Cluster);
        assert_eq!(summaries[2].business_relevance, BusinessRelevance::Low);
        assert_eq!(
            summaries[2].explanation,
            "Cluster of themes with fewer than 3 mentions each"
        );
    }
}
