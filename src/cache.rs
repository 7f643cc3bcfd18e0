//! Staleness-gated, single-flight snapshot cache.
//!
//! [`SnapshotCache::get_snapshot`] serves the in-memory snapshot while it is
//! younger than `stale_after`. Once it is stale (or absent) the caller
//! triggers a refresh: ingest, persist, swap. Concurrent callers that find
//! a refresh in flight wait on the same shared future instead of starting
//! another, so at most one ingestion runs per cache at any time.
//!
//! The refresh itself runs in a spawned task. A caller that is dropped
//! while waiting does not cancel the ingestion other callers depend on.
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | fresh snapshot | returned, no fetch |
//! | stale or empty, refresh ok | new snapshot persisted, then returned |
//! | stale, refresh fails | stale snapshot returned, failure logged |
//! | empty, refresh fails | error returned |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use rankings_core::models::Snapshot;
use rankings_core::store::SnapshotStore;
use rankings_core::timestamp;

use crate::config::{CacheBackend, CacheConfig, Config};
use crate::error::IngestError;
use crate::ingest::Pipeline;
use crate::store_json::JsonFileStore;
use crate::store_sqlite::SqliteStore;

type RefreshFuture = Shared<BoxFuture<'static, Result<Arc<Snapshot>, IngestError>>>;

// Roughly a century; keeps the conversion to chrono in range.
const MAX_STALE_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Freshness of the cached snapshot at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh {
        last_updated: DateTime<Utc>,
        age: Duration,
    },
    Stale {
        last_updated: DateTime<Utc>,
        age: Duration,
    },
}

impl CacheState {
    pub fn label(&self) -> &'static str {
        match self {
            CacheState::Empty => "empty",
            CacheState::Fresh { .. } => "fresh",
            CacheState::Stale { .. } => "stale",
        }
    }
}

/// Open the store selected by `[cache] backend`.
pub async fn open_store(cache: &CacheConfig) -> Result<Arc<dyn SnapshotStore>> {
    let store: Arc<dyn SnapshotStore> = match cache.backend {
        CacheBackend::Json => Arc::new(JsonFileStore::new(&cache.path)),
        CacheBackend::Sqlite => Arc::new(SqliteStore::open(&cache.path).await?),
    };
    Ok(store)
}

#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<Inner>,
}

struct Inner {
    pipeline: Pipeline,
    store: Arc<dyn SnapshotStore>,
    stale_after: Duration,
    current: RwLock<Option<Arc<Snapshot>>>,
    loaded: OnceCell<()>,
    in_flight: Mutex<Option<(u64, RefreshFuture)>>,
    generation: AtomicU64,
}

impl SnapshotCache {
    pub fn new(
        pipeline: Pipeline,
        store: Arc<dyn SnapshotStore>,
        stale_after: std::time::Duration,
    ) -> Self {
        let secs = i64::try_from(stale_after.as_secs())
            .unwrap_or(MAX_STALE_SECS)
            .min(MAX_STALE_SECS);
        Self {
            inner: Arc::new(Inner {
                pipeline,
                store,
                stale_after: Duration::seconds(secs),
                current: RwLock::new(None),
                loaded: OnceCell::new(),
                in_flight: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Cache over the configured HTTP source and storage backend.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pipeline = Pipeline::from_config(&config.source)?;
        let store = open_store(&config.cache).await?;
        info!(store = %store.describe(), "snapshot cache ready");
        Ok(Self::new(pipeline, store, config.cache.stale_after()))
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.inner.store
    }

    /// Return a snapshot no older than `stale_after`, refreshing if needed.
    ///
    /// A stale snapshot is still returned when the refresh fails; an error
    /// is returned only when there is no snapshot at all.
    pub async fn get_snapshot(&self) -> Result<Arc<Snapshot>, IngestError> {
        self.inner.ensure_loaded().await;

        if let Some(snapshot) = self.inner.current() {
            let now = timestamp::now();
            if !snapshot.is_stale(now, self.inner.stale_after) {
                debug!(age_secs = snapshot.age(now).num_seconds(), "serving cached snapshot");
                return Ok(snapshot);
            }
            info!(
                last_updated = %timestamp::format_http_date(&snapshot.last_updated),
                "snapshot is stale, refreshing"
            );
        } else {
            info!("no snapshot cached, ingesting");
        }

        match self.join_refresh().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => match self.inner.current() {
                Some(stale) => {
                    warn!(
                        error = %e,
                        last_updated = %timestamp::format_http_date(&stale.last_updated),
                        "refresh failed, serving stale snapshot"
                    );
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }

    /// Run an ingestion regardless of staleness, joining one already in
    /// flight. Failures are returned, never masked by an older snapshot.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, IngestError> {
        self.inner.ensure_loaded().await;
        self.join_refresh().await
    }

    /// The snapshot held right now, stale or not. Never ingests.
    pub async fn cached(&self) -> Option<Arc<Snapshot>> {
        self.inner.ensure_loaded().await;
        self.inner.current()
    }

    pub async fn state(&self) -> CacheState {
        self.inner.ensure_loaded().await;
        match self.inner.current() {
            None => CacheState::Empty,
            Some(snapshot) => {
                let now = timestamp::now();
                let last_updated = snapshot.last_updated;
                let age = snapshot.age(now);
                if snapshot.is_stale(now, self.inner.stale_after) {
                    CacheState::Stale { last_updated, age }
                } else {
                    CacheState::Fresh { last_updated, age }
                }
            }
        }
    }

    async fn join_refresh(&self) -> Result<Arc<Snapshot>, IngestError> {
        let (generation, refresh) = {
            let mut slot = self.inner.lock_in_flight();
            match slot.as_ref() {
                Some((generation, refresh)) => {
                    debug!(generation, "joining in-flight refresh");
                    (*generation, refresh.clone())
                }
                None => {
                    let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst);
                    let refresh = self.spawn_refresh(generation);
                    *slot = Some((generation, refresh.clone()));
                    (generation, refresh)
                }
            }
        };

        let result = refresh.await;
        // The task clears its own slot; this covers a task that panicked.
        self.inner.finish(generation);
        result
    }

    fn spawn_refresh(&self, generation: u64) -> RefreshFuture {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let result = inner.refresh_once().await;
            inner.finish(generation);
            result
        });
        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(IngestError::Aborted(e.to_string())))
        }
        .boxed()
        .shared()
    }
}

impl Inner {
    fn current(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_current(&self, snapshot: Arc<Snapshot>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<(u64, RefreshFuture)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the in-flight slot if it still belongs to `generation`.
    fn finish(&self, generation: u64) {
        let mut slot = self.lock_in_flight();
        if matches!(slot.as_ref(), Some((g, _)) if *g == generation) {
            *slot = None;
        }
    }

    /// Read the persisted snapshot into memory, once.
    async fn ensure_loaded(&self) {
        self.loaded
            .get_or_init(|| async {
                match self.store.load().await {
                    Ok(Some(snapshot)) => {
                        info!(
                            store = %self.store.describe(),
                            last_updated = %timestamp::format_http_date(&snapshot.last_updated),
                            "loaded persisted snapshot"
                        );
                        if self.current().is_none() {
                            self.set_current(Arc::new(snapshot));
                        }
                    }
                    Ok(None) => info!(store = %self.store.describe(), "no persisted snapshot"),
                    Err(e) => warn!(
                        store = %self.store.describe(),
                        error = %format!("{:#}", e),
                        "failed to load persisted snapshot, starting empty"
                    ),
                }
            })
            .await;
    }

    /// Ingest, persist, then swap in memory. Nothing changes on failure.
    async fn refresh_once(&self) -> Result<Arc<Snapshot>, IngestError> {
        self.ensure_loaded().await;
        let mut snapshot = self.pipeline.ingest().await?;

        if let Some(previous) = self.current() {
            if snapshot.last_updated < previous.last_updated {
                debug!("clamping lastUpdated to the previous snapshot");
                snapshot.last_updated = previous.last_updated;
            }
        }

        self.store
            .replace(&snapshot)
            .await
            .map_err(|e| IngestError::Persist(format!("{:#}", e)))?;

        let snapshot = Arc::new(snapshot);
        self.set_current(snapshot.clone());
        info!(
            store = %self.store.describe(),
            last_updated = %timestamp::format_http_date(&snapshot.last_updated),
            "snapshot committed"
        );
        Ok(snapshot)
    }
}
