use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::query::snapshot::{Item, LogEntry, Snapshot};

/// Headline numbers for the metrics row of the dashboard.
///
/// Ratios that cannot be computed (no rows, zero-day span) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_items: u64,
    pub total_logs: u64,
    pub distinct_aliases: u64,
    /// Mean log rows per used alias, one decimal.
    pub average_usage_per_alias: Option<f64>,
    /// Distinct aliases created per day over the creation span, two decimals.
    pub items_per_day: Option<f64>,
    /// Fraction of created aliases that never appear in the logs, two decimals.
    pub never_used_share: Option<f64>,
    /// Mean days between an alias's creation and its last use, one decimal.
    pub average_lifespan_days: Option<f64>,
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mean number of log rows per alias. Aliases absent from `logs` are not
/// part of the mean. `None` for empty input.
pub fn average_usage_per_alias(logs: &[LogEntry]) -> Option<f64> {
    let aliases: HashSet<&str> = logs.iter().map(|log| log.alias.as_str()).collect();
    if aliases.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = logs.len() as f64 / aliases.len() as f64;
    Some(mean)
}

/// Distinct aliases created per day between the first and last creation.
///
/// The span is counted in whole days. A span of zero days (including a
/// single item or no items at all) is [`StatsError::DegenerateRange`].
pub fn creation_rate(items: &[Item]) -> Result<f64, StatsError> {
    let (Some(first), Some(last)) = (
        items.iter().map(|i| i.created).min(),
        items.iter().map(|i| i.created).max(),
    ) else {
        return Err(StatsError::DegenerateRange);
    };

    let span_days = (last - first).num_days();
    if span_days <= 0 {
        return Err(StatsError::DegenerateRange);
    }

    let distinct: HashSet<&str> = items.iter().map(|i| i.alias.as_str()).collect();
    #[allow(clippy::cast_precision_loss)]
    let rate = distinct.len() as f64 / span_days as f64;
    Ok(rate)
}

/// Fraction of distinct created aliases with no log row. `None` without items.
pub fn never_used_share(items: &[Item], logs: &[LogEntry]) -> Option<f64> {
    let created: HashSet<&str> = items.iter().map(|i| i.alias.as_str()).collect();
    if created.is_empty() {
        return None;
    }
    let used: HashSet<&str> = logs.iter().map(|l| l.alias.as_str()).collect();
    let unused = created.difference(&used).count();
    #[allow(clippy::cast_precision_loss)]
    let share = unused as f64 / created.len() as f64;
    Some(share)
}

/// Mean time in days from an alias's first creation to its last use.
///
/// Only aliases that are both created and used count. Uses logged before
/// the creation record count as zero days. `None` when no alias qualifies.
pub fn average_lifespan_days(items: &[Item], logs: &[LogEntry]) -> Option<f64> {
    let mut created: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for item in items {
        created
            .entry(item.alias.as_str())
            .and_modify(|t| *t = (*t).min(item.created))
            .or_insert(item.created);
    }

    let mut last_use: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for log in logs {
        if created.contains_key(log.alias.as_str()) {
            last_use
                .entry(log.alias.as_str())
                .and_modify(|t| *t = (*t).max(log.created))
                .or_insert(log.created);
        }
    }
    if last_use.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let total_days: f64 = last_use
        .iter()
        .map(|(alias, last)| {
            let secs = (*last - created[alias]).num_seconds().max(0);
            secs as f64 / 86_400.0
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = total_days / last_use.len() as f64;
    Some(mean)
}

/// Compute the metrics row for a snapshot.
pub fn summarize(snapshot: &Snapshot) -> SummaryMetrics {
    let Snapshot { items, logs, .. } = snapshot;
    let distinct: HashSet<&str> = logs.iter().map(|l| l.alias.as_str()).collect();

    let items_per_day = match creation_rate(items) {
        Ok(rate) => Some(round_to(rate, 2)),
        Err(e) => {
            tracing::debug!(error = %e, "Creation rate unavailable");
            None
        }
    };

    SummaryMetrics {
        total_items: items.len() as u64,
        total_logs: logs.len() as u64,
        distinct_aliases: distinct.len() as u64,
        average_usage_per_alias: average_usage_per_alias(logs).map(|v| round_to(v, 1)),
        items_per_day,
        never_used_share: never_used_share(items, logs).map(|v| round_to(v, 2)),
        average_lifespan_days: average_lifespan_days(items, logs).map(|v| round_to(v, 1)),
    }
}
