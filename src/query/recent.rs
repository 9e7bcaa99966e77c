use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::query::snapshot::LogEntry;

pub const DEFAULT_RECENT_LIMIT: usize = 30;

/// A log row as shown in the recent activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentLog {
    pub alias: String,
    pub created: DateTime<Utc>,
}

/// The newest `limit` log rows, newest first.
pub fn recent_logs(logs: &[LogEntry], limit: usize) -> Vec<RecentLog> {
    let mut newest: Vec<&LogEntry> = logs.iter().collect();
    // Stable sort keeps source order among equal instants.
    newest.sort_by(|a, b| b.created.cmp(&a.created));
    newest
        .into_iter()
        .take(limit)
        .map(|log| RecentLog {
            alias: log.alias.clone(),
            created: log.created,
        })
        .collect()
}
