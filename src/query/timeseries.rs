use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::query::snapshot::{LogEntry, Timestamped};

/// An inclusive range of UTC calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub const fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// `[earliest, latest]` creation date in `rows`, or `None` when empty.
    pub fn observed<T: Timestamped>(rows: &[T]) -> Option<Self> {
        let mut dates = rows.iter().map(Timestamped::created_date);
        let first = dates.next()?;
        let (from, to) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { from, to })
    }

    /// Both ends are inclusive. An inverted range contains nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Row count for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Row count for one alias on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasDailyCount {
    pub alias: String,
    pub date: NaiveDate,
    pub count: u64,
}

/// Usage on one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    /// English weekday name, `Mon` through `Sun`.
    pub weekday: String,
    pub count: u64,
}

/// Count rows per calendar date within `range`, ascending by date.
pub fn daily_counts<T: Timestamped>(rows: &[T], range: DateRange) -> Vec<DailyCount> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in rows
        .iter()
        .map(Timestamped::created_date)
        .filter(|d| range.contains(*d))
    {
        *buckets.entry(date).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Count log rows per `(alias, date)` for the selected aliases within `range`.
///
/// Ordered by alias, then date. Aliases without rows in the window are absent.
pub fn alias_daily_counts(
    logs: &[LogEntry],
    selected: &[String],
    range: DateRange,
) -> Vec<AliasDailyCount> {
    let selected: HashSet<&str> = selected.iter().map(String::as_str).collect();
    let mut buckets: BTreeMap<(&str, NaiveDate), u64> = BTreeMap::new();
    for log in logs {
        let date = log.created_date();
        if selected.contains(log.alias.as_str()) && range.contains(date) {
            *buckets.entry((log.alias.as_str(), date)).or_default() += 1;
        }
    }
    buckets
        .into_iter()
        .map(|((alias, date), count)| AliasDailyCount {
            alias: alias.to_string(),
            date,
            count,
        })
        .collect()
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Usage per weekday within `range`, Monday first. All seven days are reported.
pub fn weekday_counts(logs: &[LogEntry], range: DateRange) -> Vec<WeekdayCount> {
    tally_weekdays(
        logs.iter()
            .map(Timestamped::created_date)
            .filter(|d| range.contains(*d)),
    )
}

/// Count `dates` per weekday, Monday first. Days without dates count zero.
pub fn tally_weekdays(dates: impl Iterator<Item = NaiveDate>) -> Vec<WeekdayCount> {
    let mut counts = [0u64; 7];
    for date in dates {
        counts[date.weekday().num_days_from_monday() as usize] += 1;
    }
    WEEK.iter()
        .zip(counts)
        .map(|(day, count)| WeekdayCount {
            weekday: day.to_string(),
            count,
        })
        .collect()
}
