//! # UFC Rankings CLI (`ufc-rankings`)
//!
//! ## Usage
//!
//! ```bash
//! ufc-rankings --config ./config/rankings.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ufc-rankings init` | Create the snapshot storage |
//! | `ufc-rankings sync [--force]` | Ingest when the snapshot is stale or missing |
//! | `ufc-rankings status` | Show snapshot freshness and contents |
//! | `ufc-rankings athletes` | List ranked athletes as JSON |
//! | `ufc-rankings athlete <id>` | Print one athlete profile as JSON |
//! | `ufc-rankings divisions` | Print every division as JSON |
//! | `ufc-rankings division <id>` | Print one division as JSON |
//! | `ufc-rankings serve` | Start the HTTP read API |
//!
//! Query commands print the same JSON the HTTP API returns, and refresh a
//! stale snapshot first, exactly as an API request would.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use ufc_rankings::cache::SnapshotCache;
use ufc_rankings::config::{self, Config};
use ufc_rankings::{ingest, logging, migrate, server, status};

/// UFC rankings scraper with a day-long snapshot cache.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/rankings.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ufc-rankings",
    about = "UFC rankings scraper with a persisted, self-refreshing snapshot",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rankings.toml`. A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/rankings.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the snapshot storage.
    ///
    /// Creates the data directory (JSON backend) or the database and its
    /// table (SQLite backend). Safe to run repeatedly.
    Init,

    /// Ingest rankings and profiles.
    ///
    /// Does nothing while the stored snapshot is fresh, unless `--force`.
    Sync {
        /// Ingest even if the stored snapshot is fresh.
        #[arg(long)]
        force: bool,
    },

    /// Show what the store holds and how old it is.
    Status,

    /// List every ranked athlete.
    Athletes,

    /// Print one athlete's full profile.
    Athlete {
        /// Athlete ID as used in profile URLs (e.g. `jon-jones`).
        id: String,
    },

    /// Print every division with profile fields joined in.
    Divisions,

    /// Print one division.
    Division {
        /// Division key (e.g. `light-heavyweight`) or title.
        id: String,
    },

    /// Start the HTTP read API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg.cache).await?;
            println!("Storage initialized at {}", cfg.cache.path.display());
        }
        Commands::Sync { force } => {
            ingest::run_sync(&cfg, force).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Athletes => {
            let snapshot = snapshot(&cfg).await?;
            print_json(&server::athletes_body(&snapshot))?;
        }
        Commands::Athlete { id } => {
            let snapshot = snapshot(&cfg).await?;
            let body = server::athlete_body(&snapshot, &id)
                .ok_or_else(|| anyhow!("fighter not found: {}", id))?;
            print_json(&body)?;
        }
        Commands::Divisions => {
            let snapshot = snapshot(&cfg).await?;
            print_json(&server::divisions_body(&snapshot))?;
        }
        Commands::Division { id } => {
            let snapshot = snapshot(&cfg).await?;
            let body = server::division_body(&snapshot, &id)
                .ok_or_else(|| anyhow!("division not found: {}", id))?;
            print_json(&body)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

async fn snapshot(cfg: &Config) -> Result<std::sync::Arc<rankings_core::models::Snapshot>> {
    let cache = SnapshotCache::from_config(cfg).await?;
    Ok(cache.get_snapshot().await?)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
