use crate::api::stats;
use crate::dashboard;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_cors = build_api_cors(state.dashboard_origin.as_deref());

    let stats_routes = Router::new()
        .route("/stats/summary", get(stats::get_summary))
        .route("/stats/controls", get(stats::get_controls))
        .route("/stats/top-aliases", get(stats::get_top_aliases))
        .route("/stats/least-used", get(stats::get_least_used))
        .route("/stats/usage", get(stats::get_usage))
        .route("/stats/alias-usage", get(stats::get_alias_usage))
        .route("/stats/creations", get(stats::get_creations))
        .route("/stats/weekdays", get(stats::get_weekdays))
        .route("/logs/recent", get(stats::get_recent_logs))
        .route("/refresh", post(stats::post_refresh));

    let api_routes = stats_routes
        .layer(CompressionLayer::new())
        .layer(api_cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
        .nest("/api", api_routes)
        .route("/", get(dashboard::serve_index))
        .route("/{*path}", get(dashboard::serve_asset))
        .layer(axum::middleware::map_response(add_security_headers))
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(30),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Inject OWASP-recommended security headers on every HTTP response.
async fn add_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    // Content-Security-Policy only on HTML responses (avoids breaking JSON APIs)
    let is_html = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"));
    if is_html {
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'self'; script-src 'self'; style-src 'self'"),
        );
    }
    response
}

/// Build CORS layer for API routes based on configured origin.
fn build_api_cors(dashboard_origin: Option<&str>) -> CorsLayer {
    dashboard_origin.map_or_else(
        || {
            // No dashboard origin configured — allow all origins.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any)
        },
        |origin| {
            let allowed_origin = origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("*"));
            CorsLayer::new()
                .allow_origin(allowed_origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        },
    )
}

/// GET /health — Simple health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

/// GET /health/detailed — Snapshot state without triggering a load.
async fn detailed_health_check(
    State(state): State<Arc<AppState>>,
) -> axum::Json<serde_json::Value> {
    let snapshot = state.cache.peek();

    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "source": state.source.describe(),
        "generation": state.cache.generation(),
        "snapshot_loaded": snapshot.is_some(),
        "items": snapshot.as_ref().map(|s| s.items.len()),
        "logs": snapshot.as_ref().map(|s| s.logs.len()),
        "loaded_at": snapshot.as_ref().map(|s| s.loaded_at.to_rfc3339()),
    }))
}
