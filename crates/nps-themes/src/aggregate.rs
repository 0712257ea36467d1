//! Aggregator: per-group statistics over (response, theme) assignment pairs.
//!
//! All counts here are *mentions*. A response tagged with two themes
//! contributes to both groups, so group counts may add up to more than the
//! number of responses. Share percentages are relative to total mentions in
//! the same context; use [`distinct_responses`] when a response count is
//! needed.

use std::collections::{HashMap, HashSet};

use nps_core::defaults::SENTIMENT_LABEL_THRESHOLD;
use nps_core::metrics::{mean, percentage, round_to};
use nps_core::{NpsBucket, NpsCategory, ThemeAggregate, ThemeAssignment};
use uuid::Uuid;

/// Grouping key for [`aggregate`].
///
/// The non-theme part of the key is the share context: under
/// [`GroupKey::ThemeMonth`] shares add up to 100 within each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Theme,
    ThemeMonth,
    ThemeTitle,
}

/// Output ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Mention count descending.
    #[default]
    ByCount,
    /// Month ascending, then mention count descending.
    Chronological,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    theme: String,
    month: Option<String>,
    title: Option<String>,
}

impl Key {
    fn of(assignment: &ThemeAssignment, group: GroupKey) -> Self {
        let (month, title) = match group {
            GroupKey::Theme => (None, None),
            GroupKey::ThemeMonth => (Some(assignment.month()), None),
            GroupKey::ThemeTitle => (None, Some(title_of(assignment))),
        };
        Self {
            theme: assignment.theme.clone(),
            month,
            title,
        }
    }

    fn context(&self) -> (Option<String>, Option<String>) {
        (self.month.clone(), self.title.clone())
    }
}

fn title_of(assignment: &ThemeAssignment) -> String {
    assignment
        .title_text
        .clone()
        .unwrap_or_else(|| "(none)".to_string())
}

#[derive(Default)]
struct Acc {
    count: i64,
    nps_sum: f64,
    sentiment_sum: f64,
    sentiment_count: i64,
    promoters: i64,
    passives: i64,
    detractors: i64,
    positive: i64,
    negative: i64,
}

impl Acc {
    fn add(&mut self, assignment: &ThemeAssignment) {
        self.count += 1;
        self.nps_sum += assignment.nps_score as f64;
        match NpsCategory::from_score(assignment.nps_score) {
            NpsCategory::Promoter => self.promoters += 1,
            NpsCategory::Passive => self.passives += 1,
            NpsCategory::Detractor => self.detractors += 1,
        }
        if let Some(s) = assignment.sentiment_score.filter(|s| s.is_finite()) {
            self.sentiment_sum += s;
            self.sentiment_count += 1;
            if s > SENTIMENT_LABEL_THRESHOLD {
                self.positive += 1;
            } else if s < -SENTIMENT_LABEL_THRESHOLD {
                self.negative += 1;
            }
        }
    }

    fn finish(self, key: Key, context_total: i64) -> ThemeAggregate {
        ThemeAggregate {
            theme: key.theme,
            month: key.month,
            title: key.title,
            count_responses: self.count,
            share_pct: round_to(percentage(self.count, context_total), 1),
            avg_nps: round_to(mean(self.nps_sum, self.count), 1),
            avg_sentiment: round_to(mean(self.sentiment_sum, self.sentiment_count), 2),
            promoters: self.promoters,
            passives: self.passives,
            detractors: self.detractors,
            pct_promoters: round_to(percentage(self.promoters, self.count), 1),
            pct_passives: round_to(percentage(self.passives, self.count), 1),
            pct_detractors: round_to(percentage(self.detractors, self.count), 1),
            pct_pos_sentiment: round_to(percentage(self.positive, self.count), 1),
            pct_neg_sentiment: round_to(percentage(self.negative, self.count), 1),
        }
    }
}

/// Keep only the assignments whose score falls in `bucket`.
pub fn restrict_to_bucket(
    assignments: Vec<ThemeAssignment>,
    bucket: Option<NpsBucket>,
) -> Vec<ThemeAssignment> {
    match bucket {
        Some(bucket) => assignments
            .into_iter()
            .filter(|a| bucket.contains(a.nps_score))
            .collect(),
        None => assignments,
    }
}

/// Number of mentions in the context.
pub fn total_mentions(assignments: &[ThemeAssignment]) -> i64 {
    assignments.len() as i64
}

/// Number of distinct responses behind the mentions.
pub fn distinct_responses(assignments: &[ThemeAssignment]) -> i64 {
    assignments
        .iter()
        .map(|a| a.response_id)
        .collect::<HashSet<Uuid>>()
        .len() as i64
}

/// Group assignments and compute per-group statistics.
pub fn aggregate(
    assignments: &[ThemeAssignment],
    group: GroupKey,
    order: SortOrder,
) -> Vec<ThemeAggregate> {
    let mut accs: HashMap<Key, Acc> = HashMap::new();
    let mut context_totals: HashMap<(Option<String>, Option<String>), i64> = HashMap::new();
    for assignment in assignments {
        let key = Key::of(assignment, group);
        *context_totals.entry(key.context()).or_default() += 1;
        accs.entry(key).or_default().add(assignment);
    }

    let mut out: Vec<ThemeAggregate> = accs
        .into_iter()
        .map(|(key, acc)| {
            let total = context_totals.get(&key.context()).copied().unwrap_or(0);
            acc.finish(key, total)
        })
        .collect();

    sort_aggregates(&mut out, order);
    out
}

/// Deterministic ordering with theme/month/title as tie-breakers.
pub fn sort_aggregates(aggregates: &mut [ThemeAggregate], order: SortOrder) {
    aggregates.sort_by(|a, b| {
        let primary = match order {
            SortOrder::ByCount => b.count_responses.cmp(&a.count_responses),
            SortOrder::Chronological => a
                .month
                .cmp(&b.month)
                .then(b.count_responses.cmp(&a.count_responses)),
        };
        primary
            .then_with(|| a.theme.cmp(&b.theme))
            .then_with(|| a.month.cmp(&b.month))
            .then_with(|| a.title.cmp(&b.title))
    });
}
