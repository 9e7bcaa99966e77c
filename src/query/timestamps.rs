use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::StatsError;
use crate::query::snapshot::Timestamped;
use crate::storage::source::{RawRow, SourceTable};

/// Date-time layouts that carry an explicit UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

/// Date-time layouts without an offset. These are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp written in any of the layouts the source produces.
///
/// PocketBase writes `2024-08-03 06:04:10.123Z`, DuckDB casts render
/// `2024-08-03 06:04:10` or `2024-08-03 06:04:10+00`, and older rows may
/// hold RFC 3339 or bare dates. Everything without an offset is UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // A trailing zulu marker means UTC; the rest is a naive layout.
    if let Some(body) = value.strip_suffix(['Z', 'z']) {
        return parse_naive(body.trim_end());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    parse_naive(value)
}

fn parse_naive(value: &str) -> Option<DateTime<Utc>> {
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date.and_time(NaiveTime::MIN).and_utc());
        }
    }
    None
}

/// Convert the `created` column of raw rows into UTC instants.
///
/// A single unparseable (or NULL) value fails the whole table.
pub fn normalize_timestamps<T: Timestamped>(
    table: SourceTable,
    rows: Vec<RawRow>,
) -> Result<Vec<T>, StatsError> {
    rows.into_iter()
        .enumerate()
        .map(|(row, raw)| {
            let created = raw
                .created
                .as_deref()
                .and_then(parse_timestamp)
                .ok_or_else(|| StatsError::TimestampParse {
                    table,
                    row,
                    value: raw.created.clone().unwrap_or_else(|| "NULL".to_string()),
                })?;
            Ok(T::from_parts(raw.alias, created))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::snapshot::LogEntry;
    use chrono::TimeZone;

    fn midnight_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_mixed_formats_same_instant() {
        let a = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
        let b = parse_timestamp("2024-01-01 00:00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, midnight_utc());
    }

    #[test]
    fn test_pocketbase_format() {
        let ts = parse_timestamp("2024-08-03 06:04:10.123Z").unwrap();
        assert_eq!(
            ts,
            Utc.with_ymd_and_hms(2024, 8, 3, 6, 4, 10).unwrap()
                + chrono::Duration::milliseconds(123)
        );
    }

    #[test]
    fn test_duckdb_timestamptz_cast() {
        assert_eq!(
            parse_timestamp("2024-01-01 00:00:00+00"),
            Some(midnight_utc())
        );
    }

    #[test]
    fn test_offset_is_converted_to_utc() {
        let ts = parse_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, midnight_utc());
        let ts = parse_timestamp("2024-01-01 02:00:00+0200").unwrap();
        assert_eq!(ts, midnight_utc());
    }

    #[test]
    fn test_bare_date_is_midnight() {
        assert_eq!(parse_timestamp("2024-01-01"), Some(midnight_utc()));
        assert_eq!(parse_timestamp("2024/01/01"), Some(midnight_utc()));
    }

    #[test]
    fn test_minute_precision() {
        assert_eq!(parse_timestamp("2024-01-01 00:00"), Some(midnight_utc()));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }

    #[test]
    fn test_normalize_keeps_every_row() {
        let rows = vec![
            RawRow::new("g", Some("2024-01-01T00:00:00Z")),
            RawRow::new("h", Some("2024-01-02 12:00:00.000Z")),
        ];
        let logs: Vec<LogEntry> = normalize_timestamps(SourceTable::Logs, rows).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].alias, "g");
        assert_eq!(logs[0].created, midnight_utc());
        assert_eq!(logs[1].created_date().to_string(), "2024-01-02");
    }

    #[test]
    fn test_normalize_fails_on_bad_value() {
        let rows = vec![
            RawRow::new("g", Some("2024-01-01")),
            RawRow::new("h", Some("not a date")),
        ];
        let err = normalize_timestamps::<LogEntry>(SourceTable::Logs, rows).unwrap_err();
        match err {
            StatsError::TimestampParse { table, row, value } => {
                assert_eq!(table, SourceTable::Logs);
                assert_eq!(row, 1);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_normalize_fails_on_null() {
        let rows = vec![RawRow::new("g", None)];
        let err = normalize_timestamps::<LogEntry>(SourceTable::Items, rows).unwrap_err();
        assert!(matches!(
            err,
            StatsError::TimestampParse { ref value, .. } if value == "NULL"
        ));
    }
}
