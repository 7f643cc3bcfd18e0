//! # UFC Rankings
//!
//! Scrapes the official UFC rankings, enriches every ranked athlete with
//! their profile page, and keeps the result as a single persisted snapshot
//! that is re-ingested once it is more than a day old.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────────┐
//! │  Fetch   │──▶│  Extract  │──▶│  Enrich  │──▶│   Snapshot   │
//! │  (HTTP)  │   │ (scraper) │   │ (N pages)│   │ JSON/SQLite  │
//! └──────────┘   └───────────┘   └──────────┘   └──────┬───────┘
//!                                                      │
//!                                  ┌───────────────────┤
//!                                  ▼                   ▼
//!                             ┌──────────┐       ┌──────────┐
//!                             │   CLI    │       │   HTTP   │
//!                             └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ufc-rankings init              # create storage
//! ufc-rankings sync              # ingest if stale
//! ufc-rankings division heavyweight
//! ufc-rankings serve             # start the read API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`error`] | Ingestion error taxonomy |
//! | [`extract`] | Rankings and profile document parsing |
//! | [`fetch`] | Single-attempt HTTP document fetch |
//! | [`enrich`] | Bounded concurrent profile enrichment |
//! | [`ingest`] | Ingestion pipeline |
//! | [`cache`] | Staleness-gated single-flight snapshot cache |
//! | [`store_json`] | JSON file snapshot store |
//! | [`store_sqlite`] | SQLite snapshot store |
//! | [`db`] | Database connection |
//! | [`migrate`] | Storage initialization |
//! | [`server`] | HTTP read API |
//! | [`status`] | Snapshot status overview |
//!
//! Data types, the timestamp codec, read views and the store trait live in
//! the I/O-free `rankings_core` crate.

pub mod cache;
pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod status;
pub mod store_json;
pub mod store_sqlite;

#[cfg(test)]
pub(crate) mod testing;
