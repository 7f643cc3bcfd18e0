//! # Rankings Core
//!
//! Shared, I/O-free logic for the UFC rankings service: the snapshot data
//! model, the HTTP-date timestamp codec used in persisted snapshots, the
//! merged read views, and the snapshot store abstraction.
//!
//! This crate contains no tokio, reqwest, sqlx, or filesystem code. Backends
//! that touch the network or disk live in the `ufc-rankings` crate.

pub mod models;
pub mod store;
pub mod timestamp;
pub mod view;
