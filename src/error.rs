//! Error taxonomy for the ingestion pipeline.
//!
//! | Error | Raised by | Scope |
//! |-------|-----------|-------|
//! | [`FetchError`] | [`fetch`](crate::fetch) | one HTTP GET |
//! | [`MalformedDocument`] | [`extract`](crate::extract) | one record or one document |
//! | [`PartialEnrichmentFailure`] | [`enrich`](crate::enrich) | one enrichment batch |
//! | [`IngestError`] | [`ingest`](crate::ingest), [`cache`](crate::cache) | one ingestion attempt |
//!
//! All errors are `Clone`: a single ingestion outcome is handed to every
//! caller coalesced onto the same in-flight refresh.

use std::collections::BTreeMap;

use thiserror::Error;

/// Network failure, timeout, or non-2xx response for one URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("fetch {url} failed: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

/// A structurally required field is missing from a document or record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed document ({context}): missing {missing}")]
pub struct MalformedDocument {
    /// Which document or record was being extracted.
    pub context: String,
    /// The required field that was not found.
    pub missing: String,
}

impl MalformedDocument {
    pub fn new(context: impl Into<String>, missing: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            missing: missing.into(),
        }
    }
}

/// Why a single profile could not be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Malformed(#[from] MalformedDocument),
}

/// One or more profiles in an enrichment batch failed.
///
/// There is no partial success: a batch with any failure produces no
/// profiles at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "enrichment failed for {} athlete(s): {}",
    .failures.len(),
    .failures.keys().cloned().collect::<Vec<_>>().join(", ")
)]
pub struct PartialEnrichmentFailure {
    /// Failure reason per athlete ID.
    pub failures: BTreeMap<String, ProfileError>,
}

impl PartialEnrichmentFailure {
    pub fn failed_ids(&self) -> Vec<String> {
        self.failures.keys().cloned().collect()
    }
}

/// Failure of one ingestion attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("rankings fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("rankings extraction failed: {0}")]
    Malformed(#[from] MalformedDocument),
    #[error(transparent)]
    Enrichment(#[from] PartialEnrichmentFailure),
    #[error("snapshot could not be persisted: {0}")]
    Persist(String),
    #[error("ingestion task aborted: {0}")]
    Aborted(String),
}
