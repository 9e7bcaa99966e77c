use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::query::snapshot::LogEntry;

/// An alias and how many log rows reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasUsageCount {
    pub alias: String,
    pub count: u64,
}

/// Step of the upper-limit slider; the rounded maximum is a multiple of it.
pub const UPPER_LIMIT_STEP: u64 = 500;

/// Count log rows per alias, most used first. Ties are ordered by alias.
pub fn alias_usage_counts(logs: &[LogEntry]) -> Vec<AliasUsageCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for log in logs {
        *counts.entry(log.alias.as_str()).or_default() += 1;
    }
    let mut rows: Vec<AliasUsageCount> = counts
        .into_iter()
        .map(|(alias, count)| AliasUsageCount {
            alias: alias.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.alias.cmp(&b.alias)));
    rows
}

/// The `n` most used aliases whose count does not exceed `upper_limit`.
///
/// Sorted by count descending, ties by alias ascending.
pub fn top_aliases_by_usage(
    logs: &[LogEntry],
    n: usize,
    upper_limit: u64,
) -> Vec<AliasUsageCount> {
    alias_usage_counts(logs)
        .into_iter()
        .filter(|row| row.count <= upper_limit)
        .take(n)
        .collect()
}

/// The `n` least used aliases among those that appear in `logs`.
///
/// Sorted by count ascending, ties by alias ascending.
pub fn least_used_aliases(logs: &[LogEntry], n: usize) -> Vec<AliasUsageCount> {
    let mut rows = alias_usage_counts(logs);
    rows.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.alias.cmp(&b.alias)));
    rows.truncate(n);
    rows
}

/// Largest per-alias count rounded to the nearest thousand, halves to even.
///
/// This is the upper bound and default of the count-limit control. Returns 0
/// for empty input.
pub fn rounded_max_count(counts: &[AliasUsageCount]) -> u64 {
    let Some(max) = counts.iter().map(|row| row.count).max() else {
        return 0;
    };
    let thousands = max / 1000;
    let rem = max % 1000;
    let rounded = match rem.cmp(&500) {
        std::cmp::Ordering::Less => thousands,
        std::cmp::Ordering::Greater => thousands + 1,
        std::cmp::Ordering::Equal => thousands + (thousands % 2),
    };
    rounded * 1000
}

/// Distinct aliases in `logs`, in order of first appearance.
pub fn distinct_aliases(logs: &[LogEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    logs.iter()
        .filter(|log| seen.insert(log.alias.as_str()))
        .map(|log| log.alias.clone())
        .collect()
}
