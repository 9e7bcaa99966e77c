use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// A row with an alias and a normalized creation instant.
///
/// Implemented by both source tables so the date-window aggregations
/// work on either one.
pub trait Timestamped {
    fn from_parts(alias: String, created: DateTime<Utc>) -> Self;

    fn alias(&self) -> &str;

    fn created(&self) -> DateTime<Utc>;

    /// Calendar date of `created` in UTC.
    fn created_date(&self) -> NaiveDate {
        self.created().date_naive()
    }
}

/// A created alias (`items` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub alias: String,
    pub created: DateTime<Utc>,
}

/// One usage of an alias (`logs` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub alias: String,
    pub created: DateTime<Utc>,
}

impl Timestamped for Item {
    fn from_parts(alias: String, created: DateTime<Utc>) -> Self {
        Self { alias, created }
    }

    fn alias(&self) -> &str {
        &self.alias
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

impl Timestamped for LogEntry {
    fn from_parts(alias: String, created: DateTime<Utc>) -> Self {
        Self { alias, created }
    }

    fn alias(&self) -> &str {
        &self.alias
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

/// Both source tables as read at `loaded_at`. Immutable once built.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub logs: Vec<LogEntry>,
    pub loaded_at: DateTime<Utc>,
    /// Cache generation this snapshot was loaded under.
    pub generation: u64,
}

impl Snapshot {
    pub fn new(items: Vec<Item>, logs: Vec<LogEntry>) -> Self {
        Self {
            items,
            logs,
            loaded_at: Utc::now(),
            generation: 0,
        }
    }
}
