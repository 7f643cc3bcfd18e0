//! Snapshot status overview.
//!
//! Summarizes what the configured store holds: freshness, counts, and a
//! per-division breakdown. Used by `ufc-rankings status`; never ingests.

use anyhow::Result;

use rankings_core::timestamp::format_http_date;

use crate::cache::{CacheState, SnapshotCache};
use crate::config::Config;

/// Run the status command: load the stored snapshot and print a summary.
pub async fn run_status(config: &Config) -> Result<()> {
    let cache = SnapshotCache::from_config(config).await?;
    let state = cache.state().await;
    let file_size = std::fs::metadata(&config.cache.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("UFC Rankings — Snapshot Status");
    println!("==============================");
    println!();
    println!("  Store:       {}", cache.store().describe());
    println!("  Size:        {}", format_bytes(file_size));
    println!(
        "  Stale after: {}",
        format_secs(config.cache.stale_after_secs as i64)
    );
    println!("  State:       {}", state.label());

    match &state {
        CacheState::Empty => {
            println!();
            println!("  No snapshot stored. Run `ufc-rankings sync` to ingest one.");
            println!();
            return Ok(());
        }
        CacheState::Fresh { last_updated, age } | CacheState::Stale { last_updated, age } => {
            println!(
                "  Updated:     {} ({})",
                format_http_date(last_updated),
                format_age(age.num_seconds())
            );
        }
    }

    let Some(snapshot) = cache.cached().await else {
        return Ok(());
    };

    println!();
    println!("  Divisions:   {}", snapshot.divisions.len());
    println!("  Athletes:    {}", snapshot.athletes.len());
    let missing = snapshot.missing_athletes();
    if !missing.is_empty() {
        println!("  Missing:     {}", missing.join(", "));
    }

    println!();
    println!("  By division:");
    println!("  {:<28} {:<28} {:>10}", "DIVISION", "CHAMPION", "CONTENDERS");
    println!("  {}", "-".repeat(68));
    for (key, division) in snapshot.ordered_divisions() {
        println!(
            "  {:<28} {:<28} {:>10}",
            key,
            division.champion.name,
            division.contenders.len()
        );
    }
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a snapshot age as a relative time string (e.g. "3 hours ago").
fn format_age(secs: i64) -> String {
    if secs < 0 {
        return format!("{} in the future", format_secs(-secs));
    }
    if secs < 60 {
        "just now".to_string()
    } else {
        format!("{} ago", format_secs(secs))
    }
}

fn format_secs(secs: i64) -> String {
    let (n, unit) = if secs < 60 {
        (secs, "sec")
    } else if secs < 3600 {
        (secs / 60, "min")
    } else if secs < 86400 {
        (secs / 3600, "hour")
    } else {
        (secs / 86400, "day")
    };
    format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
}
