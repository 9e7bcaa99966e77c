use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::StatsError;
use crate::query::snapshot::Snapshot;

/// Thread-safe holder for the loaded snapshot with explicit invalidation.
///
/// A snapshot stays current until [`SnapshotCache::invalidate`] is called or,
/// when a TTL is configured, until it lapses.
///
/// Loads are serialized by `loading`; `state` is only ever held for a lookup
/// or a swap, so readers never wait on a running load.
#[derive(Clone)]
pub struct SnapshotCache {
    state: Arc<Mutex<CacheState>>,
    loading: Arc<Mutex<()>>,
    ttl: Option<Duration>,
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    generation: u64,
}

struct CacheEntry {
    snapshot: Arc<Snapshot>,
    inserted_at: Instant,
}

impl SnapshotCache {
    /// Create a cache whose entries expire after `ttl_secs`.
    /// A TTL of 0 keeps the snapshot until it is invalidated.
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_ttl((ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)))
    }

    /// Create a cache with an exact TTL, or none.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            loading: Arc::new(Mutex::new(())),
            ttl,
        }
    }

    /// Return the current snapshot, calling `load` only on a miss.
    ///
    /// Concurrent misses load once: later callers wait for the first load
    /// and pick up its result. A failed load leaves the cache empty. A load
    /// that finishes after an invalidation is returned but not stored.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Snapshot>, StatsError>
    where
        F: FnOnce() -> Result<Snapshot, StatsError>,
    {
        if let Some(snapshot) = self.peek() {
            return Ok(snapshot);
        }

        let _loading = self.loading.lock();
        let generation = {
            let state = self.state.lock();
            if let Some(entry) = state.entry.as_ref().filter(|e| !self.is_expired(e)) {
                return Ok(Arc::clone(&entry.snapshot));
            }
            if state.entry.is_some() {
                tracing::debug!(generation = state.generation, "Snapshot expired");
            }
            state.generation
        };

        let mut snapshot = load()?;
        snapshot.generation = generation;
        let snapshot = Arc::new(snapshot);

        let mut state = self.state.lock();
        if state.generation == generation {
            state.entry = Some(CacheEntry {
                snapshot: Arc::clone(&snapshot),
                inserted_at: Instant::now(),
            });
        } else {
            tracing::debug!(
                loaded = generation,
                current = state.generation,
                "Discarding snapshot loaded before invalidation"
            );
        }
        Ok(snapshot)
    }

    /// The cached snapshot, if one is current. Never waits on a load.
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        let state = self.state.lock();
        state
            .entry
            .as_ref()
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Drop the cached snapshot and start a new generation.
    /// Returns the new generation number.
    pub fn invalidate(&self) -> u64 {
        let mut state = self.state.lock();
        state.entry = None;
        state.generation += 1;
        tracing::info!(generation = state.generation, "Snapshot cache invalidated");
        state.generation
    }

    /// Current generation; bumped by every invalidation.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.inserted_at.elapsed() > ttl)
    }
}
