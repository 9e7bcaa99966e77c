use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{DataSourceError, StatsError};

/// API error type with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Stats(StatsError::DataSource(
                e @ (DataSourceError::Query(_) | DataSourceError::Sqlite(_)),
            )) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Data source query failed".to_string(),
                )
            }
            Self::Stats(e @ StatsError::DataSource(_)) => {
                tracing::error!(error = %e, "Data source unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            Self::Stats(e @ StatsError::TimestampParse { .. }) => {
                tracing::error!(error = %e, "Timestamp normalization failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            Self::Stats(e @ StatsError::DegenerateRange) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
