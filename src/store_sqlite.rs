//! Snapshot slot persisted in a one-row SQLite table.
//!
//! The row holds the same JSON document the file backend writes. A replace
//! is a single upsert statement whose `WHERE` clause refuses older
//! snapshots, so the swap and the monotonicity check are one atomic step.

use std::path::Path;

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use rankings_core::models::Snapshot;
use rankings_core::store::SnapshotStore;
use rankings_core::timestamp::format_http_date;

use crate::db;
use crate::migrate;

pub struct SqliteStore {
    pool: SqlitePool,
    label: String,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::ensure_schema(&pool).await?;
        Ok(Self {
            pool,
            label: format!("sqlite:{}", path.display()),
        })
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn load(&self) -> Result<Option<Snapshot>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM snapshot_slot WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let Some(body) = body else {
            return Ok(None);
        };
        match serde_json::from_str::<Snapshot>(&body) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(store = %self.label, error = %e, "stored snapshot corrupt, treating as empty");
                Ok(None)
            }
        }
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_string(snapshot)?;
        let stamp = snapshot.last_updated.timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO snapshot_slot (id, last_updated, body)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                last_updated = excluded.last_updated,
                body = excluded.body
            WHERE excluded.last_updated >= snapshot_slot.last_updated
            "#,
        )
        .bind(stamp)
        .bind(&body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!(
                "refusing to replace stored snapshot with older snapshot from {}",
                format_http_date(&snapshot.last_updated)
            );
        }
        debug!(store = %self.label, bytes = body.len(), "snapshot persisted");
        Ok(())
    }
}
