//! In-memory [`SnapshotStore`] for tests and embedding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::Snapshot;

use super::SnapshotStore;

/// Snapshot slot held behind a `RwLock`. Counts successful writes.
pub struct InMemoryStore {
    slot: RwLock<Option<Snapshot>>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            writes: AtomicUsize::new(0),
        }
    }

    /// A store pre-seeded with `snapshot`. Seeding does not count as a write.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: RwLock::new(Some(snapshot)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful [`replace`](SnapshotStore::replace) calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Option<Snapshot>> {
        let slot = self.slot.read().map_err(|_| anyhow!("snapshot slot poisoned"))?;
        Ok(slot.clone())
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| anyhow!("snapshot slot poisoned"))?;
        if let Some(current) = slot.as_ref() {
            if snapshot.last_updated < current.last_updated {
                bail!(
                    "refusing to replace snapshot from {} with older snapshot from {}",
                    current.last_updated,
                    snapshot.last_updated
                );
            }
        }
        *slot = Some(snapshot.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
