//! Storage initialization for both cache backends.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::{CacheBackend, CacheConfig};
use crate::db;

/// Create whatever the configured backend needs before first use.
///
/// JSON: the parent directory of the snapshot file. SQLite: the database
/// file and the `snapshot_slot` table. Safe to run repeatedly.
pub async fn run_migrations(cache: &CacheConfig) -> Result<()> {
    match cache.backend {
        CacheBackend::Json => {
            if let Some(parent) = cache.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
        }
        CacheBackend::Sqlite => {
            let pool = db::connect(&cache.path).await?;
            ensure_schema(&pool).await?;
            pool.close().await;
        }
    }
    info!(backend = ?cache.backend, path = %cache.path.display(), "storage initialized");
    Ok(())
}

/// Create the one-row snapshot table if it does not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshot_slot (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_updated INTEGER NOT NULL,
            body TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
