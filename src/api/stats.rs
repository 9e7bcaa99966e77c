use crate::api::errors::ApiError;
use crate::config::split_aliases;
use crate::query::breakdowns::{self, AliasUsageCount, UPPER_LIMIT_STEP};
use crate::query::metrics::{self, SummaryMetrics};
use crate::query::recent::{self, RecentLog, DEFAULT_RECENT_LIMIT};
use crate::query::timeseries::{self, AliasDailyCount, DailyCount, DateRange, WeekdayCount};
use crate::state::AppState;
use axum::extract::{FromRequestParts, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TOP_N_MIN: usize = 5;
pub const TOP_N_MAX: usize = 20;
pub const TOP_N_DEFAULT: usize = 15;

const LEAST_USED_MAX: usize = 100;
const RECENT_MAX: usize = 500;

/// [`Query`] whose rejections carry the JSON error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Inclusive date window parameters shared by the time-series endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {name} date: {value}. Use YYYY-MM-DD.")))
}

impl RangeParams {
    /// Resolve the window, filling missing ends from the observed span.
    ///
    /// Returns `None` when an end is missing and the table is empty, i.e.
    /// there is nothing to show.
    pub fn resolve(&self, observed: Option<DateRange>) -> Result<Option<DateRange>, ApiError> {
        let from = parse_date("from", self.from.as_deref())?;
        let to = parse_date("to", self.to.as_deref())?;

        let (Some(from), Some(to)) = (
            from.or_else(|| observed.map(|span| span.from)),
            to.or_else(|| observed.map(|span| span.to)),
        ) else {
            return Ok(None);
        };

        if from > to {
            return Err(ApiError::BadRequest(
                "to must be on or after from".to_string(),
            ));
        }
        Ok(Some(DateRange::new(from, to)))
    }
}

/// Bounds and default of a slider control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliderBounds {
    pub min: u64,
    pub max: u64,
    pub step: u64,
    pub default: u64,
}

/// Parameter domains for the dashboard widgets, derived from the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardControls {
    pub top_n: SliderBounds,
    pub upper_limit: SliderBounds,
    pub log_span: Option<DateRange>,
    pub item_span: Option<DateRange>,
    /// Multiselect options, in order of first use.
    pub aliases: Vec<String>,
    pub default_aliases: Vec<String>,
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
}

/// GET /api/stats/summary — Metrics row (usage per alias, creation rate, ...).
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SummaryMetrics>, ApiError> {
    let snapshot = state.snapshot().await?;
    Ok(Json(metrics::summarize(&snapshot)))
}

/// GET /api/stats/controls — Slider bounds, date spans and alias options.
pub async fn get_controls(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardControls>, ApiError> {
    let snapshot = state.snapshot().await?;
    let counts = breakdowns::alias_usage_counts(&snapshot.logs);
    let rounded_max = breakdowns::rounded_max_count(&counts);

    Ok(Json(DashboardControls {
        top_n: SliderBounds {
            min: TOP_N_MIN as u64,
            max: TOP_N_MAX as u64,
            step: 1,
            default: TOP_N_DEFAULT as u64,
        },
        upper_limit: SliderBounds {
            min: 0,
            max: rounded_max,
            step: UPPER_LIMIT_STEP,
            default: rounded_max,
        },
        log_span: DateRange::observed(&snapshot.logs),
        item_span: DateRange::observed(&snapshot.items),
        aliases: breakdowns::distinct_aliases(&snapshot.logs),
        default_aliases: state.default_aliases.clone(),
        generation: snapshot.generation,
        loaded_at: snapshot.loaded_at,
    }))
}

/// Query parameters for the top-aliases endpoint.
#[derive(Debug, Deserialize)]
pub struct TopParams {
    #[serde(default = "default_top_n")]
    pub n: usize,
    /// Inclusive count ceiling. Defaults to the rounded maximum count.
    pub upper_limit: Option<u64>,
}

const fn default_top_n() -> usize {
    TOP_N_DEFAULT
}

/// GET /api/stats/top-aliases — Most used aliases under a count ceiling.
pub async fn get_top_aliases(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<TopParams>,
) -> Result<Json<Vec<AliasUsageCount>>, ApiError> {
    if !(TOP_N_MIN..=TOP_N_MAX).contains(&params.n) {
        return Err(ApiError::BadRequest(format!(
            "n must be between {TOP_N_MIN} and {TOP_N_MAX}"
        )));
    }

    let snapshot = state.snapshot().await?;
    let upper_limit = params.upper_limit.unwrap_or_else(|| {
        breakdowns::rounded_max_count(&breakdowns::alias_usage_counts(&snapshot.logs))
    });
    Ok(Json(breakdowns::top_aliases_by_usage(
        &snapshot.logs,
        params.n,
        upper_limit,
    )))
}

/// Query parameters for the least-used endpoint.
#[derive(Debug, Deserialize)]
pub struct LeastUsedParams {
    #[serde(default = "default_least_n")]
    pub n: usize,
}

const fn default_least_n() -> usize {
    10
}

/// GET /api/stats/least-used — Aliases with the fewest uses.
pub async fn get_least_used(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<LeastUsedParams>,
) -> Result<Json<Vec<AliasUsageCount>>, ApiError> {
    if params.n == 0 || params.n > LEAST_USED_MAX {
        return Err(ApiError::BadRequest(format!(
            "n must be between 1 and {LEAST_USED_MAX}"
        )));
    }
    let snapshot = state.snapshot().await?;
    Ok(Json(breakdowns::least_used_aliases(&snapshot.logs, params.n)))
}

/// GET /api/stats/usage — Log rows per day.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RangeParams>,
) -> Result<Json<Vec<DailyCount>>, ApiError> {
    let snapshot = state.snapshot().await?;
    let Some(range) = params.resolve(DateRange::observed(&snapshot.logs))? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(timeseries::daily_counts(&snapshot.logs, range)))
}

/// Query parameters for the per-alias usage endpoint.
#[derive(Debug, Deserialize)]
pub struct AliasUsageParams {
    /// Comma-separated aliases. Defaults to the configured selection.
    pub aliases: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/stats/alias-usage — Log rows per alias per day.
pub async fn get_alias_usage(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<AliasUsageParams>,
) -> Result<Json<Vec<AliasDailyCount>>, ApiError> {
    let selected = params
        .aliases
        .as_deref()
        .map_or_else(|| state.default_aliases.clone(), split_aliases);
    let range_params = RangeParams {
        from: params.from,
        to: params.to,
    };

    let snapshot = state.snapshot().await?;
    let Some(range) = range_params.resolve(DateRange::observed(&snapshot.logs))? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(timeseries::alias_daily_counts(
        &snapshot.logs,
        &selected,
        range,
    )))
}

/// GET /api/stats/creations — New aliases per day.
pub async fn get_creations(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RangeParams>,
) -> Result<Json<Vec<DailyCount>>, ApiError> {
    let snapshot = state.snapshot().await?;
    let Some(range) = params.resolve(DateRange::observed(&snapshot.items))? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(timeseries::daily_counts(&snapshot.items, range)))
}

/// GET /api/stats/weekdays — Log rows per day of the week.
pub async fn get_weekdays(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RangeParams>,
) -> Result<Json<Vec<WeekdayCount>>, ApiError> {
    let snapshot = state.snapshot().await?;
    // The week is a fixed axis: no logs still means seven zero rows.
    let counts = match params.resolve(DateRange::observed(&snapshot.logs))? {
        Some(range) => timeseries::weekday_counts(&snapshot.logs, range),
        None => timeseries::tally_weekdays(std::iter::empty()),
    };
    Ok(Json(counts))
}

/// Query parameters for the recent logs endpoint.
#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
}

const fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

/// GET /api/logs/recent — Newest log rows.
pub async fn get_recent_logs(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<RecentParams>,
) -> Result<Json<Vec<RecentLog>>, ApiError> {
    if params.limit == 0 || params.limit > RECENT_MAX {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {RECENT_MAX}"
        )));
    }
    let snapshot = state.snapshot().await?;
    Ok(Json(recent::recent_logs(&snapshot.logs, params.limit)))
}

/// Result of a refresh request.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub generation: u64,
}

/// POST /api/refresh — Drop the cached snapshot; the next request reloads it.
pub async fn post_refresh(State(state): State<Arc<AppState>>) -> Json<RefreshResponse> {
    Json(RefreshResponse {
        generation: state.cache.invalidate(),
    })
}
