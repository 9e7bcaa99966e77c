use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::config::Config;
use crate::query::cache::SnapshotCache;
use crate::query::snapshot::Snapshot;
use crate::storage::source::{load_snapshot, DataSource};

/// Shared state behind every handler.
pub struct AppState {
    pub source: DataSource,
    pub cache: SnapshotCache,
    pub default_aliases: Vec<String>,
    pub dashboard_origin: Option<String>,
}

impl AppState {
    pub fn new(source: DataSource, config: &Config) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(config.snapshot_ttl_secs),
            default_aliases: config.default_aliases.clone(),
            dashboard_origin: config.dashboard_origin.clone(),
        }
    }

    /// The current snapshot, loading it on a blocking thread on a cache miss.
    pub async fn snapshot(self: &Arc<Self>) -> Result<Arc<Snapshot>, ApiError> {
        let state = Arc::clone(self);
        let snapshot = tokio::task::spawn_blocking(move || {
            state.cache.get_or_load(|| load_snapshot(&state.source))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Snapshot task panicked: {e}")))??;
        Ok(snapshot)
    }
}
