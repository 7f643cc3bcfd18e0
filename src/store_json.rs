//! Snapshot slot persisted as a single JSON file.
//!
//! The file holds the wire shape of [`Snapshot`] with `lastUpdated` as an
//! HTTP-date. Writes go to a sibling temp file that is then renamed over the
//! target, so readers never observe a half-written snapshot.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use rankings_core::models::Snapshot;
use rankings_core::store::SnapshotStore;
use rankings_core::timestamp::format_http_date;

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes the read-compare-write sequence in `replace`.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }

    /// A missing, unreadable or unparseable file reads as an empty slot.
    async fn load(&self) -> Result<Option<Snapshot>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted snapshot");
                return Ok(None);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "persisted snapshot unreadable, treating as empty");
                return Ok(None);
            }
        };

        match serde_json::from_str::<Snapshot>(&text) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "persisted snapshot corrupt, treating as empty");
                Ok(None)
            }
        }
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = self.load().await? {
            if snapshot.last_updated < existing.last_updated {
                bail!(
                    "refusing to replace snapshot from {} with older snapshot from {}",
                    format_http_date(&existing.last_updated),
                    format_http_date(&snapshot.last_updated)
                );
            }
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let body = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &body)
            .await
            .with_context(|| format!("writing {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("renaming {} to {}", temp.display(), self.path.display()))?;

        debug!(path = %self.path.display(), bytes = body.len(), "snapshot persisted");
        Ok(())
    }
}
