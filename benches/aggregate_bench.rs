use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use links_stats::query::breakdowns;
use links_stats::query::snapshot::{LogEntry, Snapshot};
use links_stats::query::timeseries::{self, DateRange};
use links_stats::query::{metrics, recent};

/// `size` log rows spread over 200 aliases and one year, skewed so a few
/// aliases dominate the way search shortcuts do.
fn make_logs(size: usize) -> Vec<LogEntry> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            let alias_index = (i * i) % 200 / (1 + i % 7);
            LogEntry {
                alias: format!("alias-{alias_index}"),
                created: start + Duration::minutes(i64::try_from(i * 5 % 525_600).unwrap_or(0)),
            }
        })
        .collect()
}

fn full_year() -> DateRange {
    DateRange::new(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
}

fn bench_breakdowns(c: &mut Criterion) {
    let mut group = c.benchmark_group("breakdowns");

    for size in [1_000, 10_000, 100_000] {
        let logs = make_logs(size);
        group.bench_with_input(BenchmarkId::new("top_aliases", size), &logs, |b, logs| {
            b.iter(|| breakdowns::top_aliases_by_usage(logs, 15, u64::MAX));
        });
        group.bench_with_input(BenchmarkId::new("least_used", size), &logs, |b, logs| {
            b.iter(|| breakdowns::least_used_aliases(logs, 10));
        });
    }

    group.finish();
}

fn bench_timeseries(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeseries");
    let selected = vec!["alias-0".to_string(), "alias-4".to_string()];

    for size in [1_000, 10_000, 100_000] {
        let logs = make_logs(size);
        group.bench_with_input(BenchmarkId::new("daily_counts", size), &logs, |b, logs| {
            b.iter(|| timeseries::daily_counts(logs, full_year()));
        });
        group.bench_with_input(
            BenchmarkId::new("alias_daily_counts", size),
            &logs,
            |b, logs| {
                b.iter(|| timeseries::alias_daily_counts(logs, &selected, full_year()));
            },
        );
        group.bench_with_input(BenchmarkId::new("weekday_counts", size), &logs, |b, logs| {
            b.iter(|| timeseries::weekday_counts(logs, full_year()));
        });
    }

    group.finish();
}

/// Everything a full dashboard render computes from one snapshot.
fn bench_dashboard_render(c: &mut Criterion) {
    let snapshot = Snapshot::new(Vec::new(), make_logs(100_000));
    let range = full_year();

    c.bench_function("dashboard_render_100k", |b| {
        b.iter(|| {
            let counts = breakdowns::alias_usage_counts(&snapshot.logs);
            let limit = breakdowns::rounded_max_count(&counts);
            let top = breakdowns::top_aliases_by_usage(&snapshot.logs, 15, limit);
            let summary = metrics::summarize(&snapshot);
            let daily = timeseries::daily_counts(&snapshot.logs, range);
            let recent = recent::recent_logs(&snapshot.logs, recent::DEFAULT_RECENT_LIMIT);
            (top, summary, daily, recent)
        });
    });
}

criterion_group!(
    benches,
    bench_breakdowns,
    bench_timeseries,
    bench_dashboard_render
);
criterion_main!(benches);
