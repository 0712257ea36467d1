//! Collapse of rarely mentioned themes into the "Other (cluster)" bucket.
//!
//! Collapsing happens on the assignment pairs before aggregation, so the
//! cluster row gets real averages and shares still add up over the context.

use std::collections::HashMap;

use nps_core::defaults::{OTHER_CLUSTER_MIN_MENTIONS, OTHER_CLUSTER_NAME};
use nps_core::{ClusterMember, ThemeAssignment};

/// Mention count per raw theme.
fn counts(assignments: &[ThemeAssignment]) -> HashMap<&str, i64> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for a in assignments {
        *counts.entry(a.theme.as_str()).or_default() += 1;
    }
    counts
}

/// Themes below `min_mentions` in this context, most mentioned first.
pub fn other_breakdown(assignments: &[ThemeAssignment], min_mentions: i64) -> Vec<ClusterMember> {
    let mut members: Vec<ClusterMember> = counts(assignments)
        .into_iter()
        .filter(|(theme, mentions)| *mentions < min_mentions && *theme != OTHER_CLUSTER_NAME)
        .map(|(theme, mentions)| ClusterMember {
            theme: theme.to_string(),
            mentions,
        })
        .collect();
    members.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.theme.cmp(&b.theme)));
    members
}

/// Relabel assignments of small themes to the cluster name.
///
/// Returns the relabelled pairs and the drill-down list of what was folded.
pub fn collapse(
    mut assignments: Vec<ThemeAssignment>,
    min_mentions: i64,
) -> (Vec<ThemeAssignment>, Vec<ClusterMember>) {
    let members = other_breakdown(&assignments, min_mentions);
    if members.is_empty() {
        return (assignments, members);
    }
    let folded: Vec<&str> = members.iter().map(|m| m.theme.as_str()).collect();
    for a in assignments.iter_mut() {
        if folded.contains(&a.theme.as_str()) {
            a.theme = OTHER_CLUSTER_NAME.to_string();
        }
    }
    (assignments, members)
}

/// [`collapse`] with the default threshold.
pub fn collapse_default(assignments: Vec<ThemeAssignment>) -> (Vec<ThemeAssignment>, Vec<ClusterMember>) {
    collapse(assignments, OTHER_CLUSTER_MIN_MENTIONS)
}
