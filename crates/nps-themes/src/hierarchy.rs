//! Main/sub-category rollups of normalized theme aggregates.

use std::collections::BTreeMap;

use serde::Serialize;

use nps_core::metrics::{percentage, round_to};
use nps_core::{MatchSource, ThemeAggregate, ThemeMapping};

use crate::normalizer::ThemeNormalizer;
use crate::patterns::MainCategory;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubCategoryNode {
    pub sub_category: String,
    pub count: i64,
    /// Mention-weighted.
    pub avg_nps: f64,
    pub avg_confidence: f64,
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub main_category: String,
    pub color: String,
    pub count: i64,
    pub avg_nps: f64,
    pub sub_categories: Vec<SubCategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub main_category: String,
    pub color: String,
    pub theme_count: usize,
    pub mentions: i64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingStats {
    pub table_version: String,
    pub total_themes: usize,
    pub pattern_matched: usize,
    pub fallback: usize,
    pub categories: Vec<CategoryStats>,
}

/// Single-label lookup for the mapping view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingView {
    pub theme: String,
    #[serde(flatten)]
    pub mapping: ThemeMapping,
    pub color: String,
}

#[derive(Default)]
struct SubAcc {
    count: i64,
    nps_weighted: f64,
    confidence_sum: f64,
    themes: Vec<String>,
}

fn color_of(main: &str) -> String {
    MainCategory::from_name(main)
        .unwrap_or(MainCategory::Other)
        .color()
        .to_string()
}

/// Group theme aggregates by (main, sub). Categories and their
/// sub-categories are ordered by mention count descending.
pub fn hierarchy(normalizer: &ThemeNormalizer, aggregates: &[ThemeAggregate]) -> Vec<CategoryNode> {
    let mut groups: BTreeMap<String, BTreeMap<String, SubAcc>> = BTreeMap::new();
    for agg in aggregates {
        let mapping = normalizer.normalize(&agg.theme);
        let acc = groups
            .entry(mapping.main_category)
            .or_default()
            .entry(mapping.sub_category)
            .or_default();
        acc.count += agg.count_responses;
        acc.nps_weighted += agg.avg_nps * agg.count_responses as f64;
        acc.confidence_sum += mapping.confidence;
        acc.themes.push(agg.theme.clone());
    }

    let mut nodes: Vec<CategoryNode> = groups
        .into_iter()
        .map(|(main, subs)| {
            let mut sub_nodes: Vec<SubCategoryNode> = subs
                .into_iter()
                .map(|(sub, acc)| SubCategoryNode {
                    sub_category: sub,
                    count: acc.count,
                    avg_nps: weighted(acc.nps_weighted, acc.count),
                    avg_confidence: round_to(acc.confidence_sum / acc.themes.len() as f64, 2),
                    themes: acc.themes,
                })
                .collect();
            sub_nodes.sort_by(|a, b| b.count.cmp(&a.count));
            let count = sub_nodes.iter().map(|s| s.count).sum();
            let nps_weighted: f64 = sub_nodes.iter().map(|s| s.avg_nps * s.count as f64).sum();
            CategoryNode {
                color: color_of(&main),
                main_category: main,
                count,
                avg_nps: weighted(nps_weighted, count),
                sub_categories: sub_nodes,
            }
        })
        .collect();
    nodes.sort_by(|a, b| b.count.cmp(&a.count));
    nodes
}

fn weighted(sum: f64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    round_to(sum / count as f64, 1)
}

/// Coverage of the pattern table over the given aggregates.
pub fn mapping_stats(normalizer: &ThemeNormalizer, aggregates: &[ThemeAggregate]) -> MappingStats {
    let total_mentions: i64 = aggregates.iter().map(|a| a.count_responses).sum();
    let mut fallback = 0;
    let mut per_main: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for agg in aggregates {
        let mapping = normalizer.normalize(&agg.theme);
        if mapping.source == MatchSource::Fallback {
            fallback += 1;
        }
        let entry = per_main.entry(mapping.main_category).or_default();
        entry.0 += 1;
        entry.1 += agg.count_responses;
    }

    let mut categories: Vec<CategoryStats> = per_main
        .into_iter()
        .map(|(main, (theme_count, mentions))| CategoryStats {
            color: color_of(&main),
            main_category: main,
            theme_count,
            mentions,
            share_pct: round_to(percentage(mentions, total_mentions), 1),
        })
        .collect();
    categories.sort_by(|a, b| b.mentions.cmp(&a.mentions));

    MappingStats {
        table_version: normalizer.table_version().to_string(),
        total_themes: aggregates.len(),
        pattern_matched: aggregates.len() - fallback,
        fallback,
        categories,
    }
}

pub fn mapping_view(normalizer: &ThemeNormalizer, theme: &str) -> MappingView {
    let mapping = normalizer.normalize(theme);
    MappingView {
        theme: theme.to_string(),
        color: color_of(&mapping.main_category),
        mapping,
    }
}
