//! Storage abstraction for the persisted snapshot slot.
//!
//! The [`SnapshotStore`] trait models exactly one durable slot holding the
//! latest [`Snapshot`]. Backends (JSON file, SQLite, in-memory) must make
//! [`replace`](SnapshotStore::replace) atomic: a reader sees either the
//! previous snapshot or the new one, never a mix.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Snapshot;

/// A single durable slot holding the latest snapshot.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load`](SnapshotStore::load) | Read the stored snapshot, if any |
/// | [`replace`](SnapshotStore::replace) | Atomically overwrite the slot |
/// | [`describe`](SnapshotStore::describe) | Human-readable location for logs |
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Short description of where the slot lives (e.g. `json:./data/rankings.json`).
    fn describe(&self) -> String;

    /// Read the stored snapshot. `Ok(None)` when the slot is empty.
    async fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot as a whole.
    ///
    /// Fails without writing if `snapshot.last_updated` is older than the
    /// stored snapshot's, keeping `lastUpdated` monotonic across writes.
    async fn replace(&self, snapshot: &Snapshot) -> Result<()>;
}
