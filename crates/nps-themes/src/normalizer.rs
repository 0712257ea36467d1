//! Theme Normalizer: raw label → (main category, sub-category).
//!
//! Matching runs through an ordered list of [`MatchTier`]s; the first tier
//! that answers wins, and an unmatched label always resolves to
//! `Other / Uncategorized`. The builtin tiers borrow the static
//! [`PatternTable`]; callers extend matching by prepending tiers
//! (for example [`LearnedTier`]) instead of editing the table.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use nps_core::{MatchSource, ThemeMapping};

use crate::patterns::{MainCategory, PatternEntry, PatternTable, UNCATEGORIZED};

pub const EXACT_CONFIDENCE: f64 = 0.95;
pub const SUBSTRING_CONFIDENCE: f64 = 0.75;
pub const WORD_CONFIDENCE: f64 = 0.85;
pub const KEYWORD_CONFIDENCE: f64 = 0.8;
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\s-]+").unwrap());

/// One matching strategy. Input is already trimmed and lowercased.
pub trait MatchTier: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_match(&self, theme: &str) -> Option<ThemeMapping>;
}

fn mapping(main: MainCategory, sub: &str, confidence: f64, source: MatchSource) -> ThemeMapping {
    ThemeMapping {
        main_category: main.name().to_string(),
        sub_category: sub.to_string(),
        confidence,
        source,
    }
}

fn from_entry(entry: &PatternEntry, confidence: f64) -> ThemeMapping {
    mapping(entry.main, entry.sub, confidence, MatchSource::Pattern)
}

/// Whole-label equality with a table pattern.
pub struct ExactTier {
    table: &'static PatternTable,
}

impl ExactTier {
    pub fn new(table: &'static PatternTable) -> Self {
        Self { table }
    }
}

impl MatchTier for ExactTier {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn try_match(&self, theme: &str) -> Option<ThemeMapping> {
        self.table
            .entries
            .iter()
            .find(|e| e.pattern == theme)
            .map(|e| from_entry(e, EXACT_CONFIDENCE))
    }
}

/// Label contains a pattern, or a pattern contains the label.
pub struct SubstringTier {
    table: &'static PatternTable,
}

impl SubstringTier {
    pub fn new(table: &'static PatternTable) -> Self {
        Self { table }
    }
}

impl MatchTier for SubstringTier {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn try_match(&self, theme: &str) -> Option<ThemeMapping> {
        self.table
            .entries
            .iter()
            .filter(|e| !e.catch_all)
            .find(|e| theme.contains(e.pattern) || e.pattern.contains(theme))
            .map(|e| from_entry(e, SUBSTRING_CONFIDENCE))
    }
}

/// Any `_`/space/`-` separated word equals a pattern.
pub struct WordTier {
    table: &'static PatternTable,
}

impl WordTier {
    pub fn new(table: &'static PatternTable) -> Self {
        Self { table }
    }
}

impl MatchTier for WordTier {
    fn name(&self) -> &'static str {
        "word"
    }

    fn try_match(&self, theme: &str) -> Option<ThemeMapping> {
        let words: Vec<&str> = WORD_SPLIT.split(theme).filter(|w| !w.is_empty()).collect();
        self.table
            .entries
            .iter()
            .find(|e| words.contains(&e.pattern))
            .map(|e| from_entry(e, WORD_CONFIDENCE))
    }
}

/// Broad keyword families, matched by substring.
pub struct KeywordGroupTier {
    table: &'static PatternTable,
}

impl KeywordGroupTier {
    pub fn new(table: &'static PatternTable) -> Self {
        Self { table }
    }
}

impl MatchTier for KeywordGroupTier {
    fn name(&self) -> &'static str {
        "keyword_group"
    }

    fn try_match(&self, theme: &str) -> Option<ThemeMapping> {
        self.table
            .keyword_groups
            .iter()
            .find(|g| g.keywords.iter().any(|k| theme.contains(k)))
            .map(|g| mapping(g.main, g.sub, KEYWORD_CONFIDENCE, MatchSource::Pattern))
    }
}

/// Explicit label → category pairs learned outside the table, e.g. curated
/// from AI-discovered themes.
#[derive(Debug, Clone, Default)]
pub struct LearnedTier {
    mappings: HashMap<String, (MainCategory, String, f64)>,
}

impl LearnedTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(
        mut self,
        theme: &str,
        main: MainCategory,
        sub: impl Into<String>,
        confidence: f64,
    ) -> Self {
        self.mappings.insert(
            theme.trim().to_lowercase(),
            (main, sub.into(), confidence.clamp(0.0, 1.0)),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl MatchTier for LearnedTier {
    fn name(&self) -> &'static str {
        "learned"
    }

    fn try_match(&self, theme: &str) -> Option<ThemeMapping> {
        self.mappings
            .get(theme)
            .map(|(main, sub, confidence)| mapping(*main, sub, *confidence, MatchSource::Ai))
    }
}

/// Mapping for labels no tier recognises.
pub fn fallback_mapping() -> ThemeMapping {
    mapping(
        MainCategory::Other,
        UNCATEGORIZED,
        FALLBACK_CONFIDENCE,
        MatchSource::Fallback,
    )
}

/// Ordered tier list over a pattern table.
pub struct ThemeNormalizer {
    table: &'static PatternTable,
    tiers: Vec<Box<dyn MatchTier>>,
}

impl ThemeNormalizer {
    /// Exact, substring, word, then keyword-group matching over `table`.
    pub fn new(table: &'static PatternTable) -> Self {
        Self {
            table,
            tiers: vec![
                Box::new(ExactTier::new(table)),
                Box::new(SubstringTier::new(table)),
                Box::new(WordTier::new(table)),
                Box::new(KeywordGroupTier::new(table)),
            ],
        }
    }

    /// Run `tier` before all existing tiers.
    pub fn with_leading_tier(mut self, tier: impl MatchTier + 'static) -> Self {
        self.tiers.insert(0, Box::new(tier));
        self
    }

    /// Replace the tier list entirely.
    pub fn with_tiers(mut self, tiers: Vec<Box<dyn MatchTier>>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn table_version(&self) -> &'static str {
        self.table.version
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Map a raw theme label. Total and deterministic.
    pub fn normalize(&self, raw: &str) -> ThemeMapping {
        let theme = raw.trim().to_lowercase();
        // An empty needle would be "contained" in every pattern.
        if theme.is_empty() {
            return fallback_mapping();
        }
        for tier in &self.tiers {
            if let Some(found) = tier.try_match(&theme) {
                trace!(
                    subsystem = "themes",
                    component = "normalizer",
                    theme = %theme,
                    tier = tier.name(),
                    main = %found.main_category,
                    "Theme matched"
                );
                return found;
            }
        }
        fallback_mapping()
    }
}

impl Default for ThemeNormalizer {
    fn default() -> Self {
        Self::new(PatternTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> ThemeMapping {
        ThemeNormalizer::default().normalize(raw)
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let m = normalize("  Pricing ");
        assert_eq!(m.main_category, "Price");
        assert_eq!(m.sub_category, "Prijzen");
        assert_eq!(m.confidence, EXACT_CONFIDENCE);
        assert_eq!(m.source, MatchSource::Pattern);
    }

    #[test]
    fn test_catch_all_matches_only_exactly() {
        let m = normalize("overige");
        assert_eq!(m.main_category, "Content");
        assert_eq!(m.sub_category, "Algemene Feedback");

        let m = normalize("overige_zaken");
        assert_ne!(m.sub_category, "Algemene Feedback");
    }

    #[test]
    fn test_substring_match_both_directions() {
        let m = normalize("bezorging_vertraagd");
        assert_eq!(m.main_category, "Delivery");
        assert_eq!(m.sub_category, "Bezorging");
        assert_eq!(m.confidence, SUBSTRING_CONFIDENCE);

        // label inside a pattern
        let m = normalize("klachtenaf");
        assert_eq!(m.main_category, "Customer Service");
        assert_eq!(m.confidence, SUBSTRING_CONFIDENCE);
    }

    #[test]
    fn test_keyword_group_tier() {
        let m = normalize("customer_satisfaction");
        assert_eq!(m.main_category, "Customer Service");
        assert_eq!(m.sub_category, "Service");
        assert_eq!(m.confidence, KEYWORD_CONFIDENCE);
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let m = normalize("xyz qqq");
        assert_eq!(m, fallback_mapping());
        assert_eq!(m.main_category, "Other");
        assert_eq!(m.sub_category, "Uncategorized");
        assert_eq!(m.source, MatchSource::Fallback);
    }

    #[test]
    fn test_empty_label_falls_back() {
        assert_eq!(normalize(""), fallback_mapping());
        assert_eq!(normalize("   "), fallback_mapping());
    }

    #[test]
    fn test_total_and_deterministic() {
        let normalizer = ThemeNormalizer::default();
        let inputs = [
            "", "a", "ü", "💥", "werkt niet", "lay-out", "merkvertrouwen", "🚚 bezorg!!",
            "x_y-z w", "ÜBER_APP", "12345",
        ];
        for input in inputs {
            let first = normalizer.normalize(input);
            let second = normalizer.normalize(input);
            assert_eq!(first, second, "{}", input);
            assert!((0.0..=1.0).contains(&first.confidence));
        }
    }

    #[test]
    fn test_word_tier_matches_split_words() {
        let tier = WordTier::new(PatternTable::builtin());
        let m = tier.try_match("snelle-bezorging_en prijs").unwrap();
        assert_eq!(m.main_category, "Price");
        assert_eq!(m.confidence, WORD_CONFIDENCE);
        assert!(tier.try_match("bezorgingen").is_none());
    }

    #[test]
    fn test_learned_tier_runs_first() {
        let normalizer = ThemeNormalizer::default().with_leading_tier(
            LearnedTier::new().with_mapping("mobiele_app", MainCategory::UserExperience, "Mobiele App", 0.9),
        );
        let m = normalizer.normalize("Mobiele_App");
        assert_eq!(m.sub_category, "Mobiele App");
        assert_eq!(m.source, MatchSource::Ai);
        assert_eq!(m.confidence, 0.9);
        assert_eq!(
            normalizer.tier_names(),
            vec!["learned", "exact", "substring", "word", "keyword_group"]
        );
    }

    #[test]
    fn test_custom_tier_list() {
        let table = PatternTable::builtin();
        let normalizer =
            ThemeNormalizer::new(table).with_tiers(vec![Box::new(WordTier::new(table))]);
        assert_eq!(normalizer.normalize("snelle_levering").confidence, WORD_CONFIDENCE);
        assert_eq!(normalizer.table_version(), table.version);
    }
}
