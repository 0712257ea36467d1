//! Month-over-month views: title NPS movers and theme share drivers.
//!
//! "Previous month" is the previous month *present* for the same title, so a
//! title with no responses in March compares April against February.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use nps_core::metrics::{nps_score, percentage, round_to};
use nps_core::{MoveDirection, ThemeAssignment, ThemeDriver, TitleMonthNps, TitleMove};

/// Largest NPS increases and decreases between consecutive months per title.
///
/// Both the month and its predecessor need at least `min_responses`. Returns
/// up to `top_k` up-moves (largest first) followed by up to `top_k`
/// down-moves (steepest first). Unchanged titles are not moves.
pub fn top_movers(rows: &[TitleMonthNps], min_responses: i64, top_k: usize) -> Vec<TitleMove> {
    let mut by_title: BTreeMap<&str, Vec<&TitleMonthNps>> = BTreeMap::new();
    for row in rows {
        by_title.entry(row.title.as_str()).or_default().push(row);
    }

    let mut ups: Vec<TitleMove> = Vec::new();
    let mut downs: Vec<TitleMove> = Vec::new();
    for (title, mut months) in by_title {
        months.sort_by(|a, b| a.month.cmp(&b.month));
        for pair in months.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            if prev.responses < min_responses || cur.responses < min_responses {
                continue;
            }
            let nps = nps_score(cur.promoters, cur.detractors, cur.responses);
            let previous_nps = nps_score(prev.promoters, prev.detractors, prev.responses);
            let delta = round_to(nps - previous_nps, 1);
            if delta == 0.0 {
                continue;
            }
            let mv = TitleMove {
                month: cur.month.clone(),
                title: title.to_string(),
                responses: cur.responses,
                nps: round_to(nps, 1),
                previous_nps: round_to(previous_nps, 1),
                mom_delta: delta,
                direction: if delta > 0.0 {
                    MoveDirection::Up
                } else {
                    MoveDirection::Down
                },
            };
            if delta > 0.0 {
                ups.push(mv);
            } else {
                downs.push(mv);
            }
        }
    }

    let tie = |a: &TitleMove, b: &TitleMove| a.title.cmp(&b.title).then_with(|| a.month.cmp(&b.month));
    ups.sort_by(|a, b| b.mom_delta.total_cmp(&a.mom_delta).then_with(|| tie(a, b)));
    downs.sort_by(|a, b| a.mom_delta.total_cmp(&b.mom_delta).then_with(|| tie(a, b)));
    ups.truncate(top_k);
    downs.truncate(top_k);

    debug!(
        subsystem = "themes",
        component = "trends",
        op = "top_movers",
        ups = ups.len(),
        downs = downs.len(),
        "Movers computed"
    );
    ups.extend(downs);
    ups
}

/// Theme share of mentions per month with the change from the previous
/// month. Pass the assignments of a single title.
///
/// Ordered by month ascending, then mention count descending.
pub fn theme_drivers(assignments: &[ThemeAssignment]) -> Vec<ThemeDriver> {
    let mut months: BTreeMap<String, HashMap<&str, i64>> = BTreeMap::new();
    for a in assignments {
        *months
            .entry(a.month())
            .or_default()
            .entry(a.theme.as_str())
            .or_default() += 1;
    }

    let mut out = Vec::new();
    let mut previous: Option<HashMap<&str, f64>> = None;
    for (month, counts) in months {
        let total: i64 = counts.values().sum();
        let shares: HashMap<&str, f64> = counts
            .iter()
            .map(|(theme, n)| (*theme, percentage(*n, total)))
            .collect();

        let mut rows: Vec<ThemeDriver> = counts
            .iter()
            .map(|(theme, n)| ThemeDriver {
                month: month.clone(),
                theme: theme.to_string(),
                count_responses: *n,
                share_pct: round_to(shares[theme], 1),
                mom_share_delta: previous
                    .as_ref()
                    .and_then(|p| p.get(theme))
                    .map(|prev| round_to(shares[theme] - prev, 1)),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.count_responses
                .cmp(&a.count_responses)
                .then_with(|| a.theme.cmp(&b.theme))
        });
        out.extend(rows);
        previous = Some(shares);
    }
    out
}
