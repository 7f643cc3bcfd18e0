//! Profile enrichment: concurrent fetch and extraction of athlete pages.
//!
//! Every athlete referenced by the parsed divisions is fetched exactly once,
//! with at most `concurrency` fetches in flight. All fetches run to
//! completion before the batch is judged; any failure fails the whole batch
//! with a [`PartialEnrichmentFailure`] naming every failed athlete.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use rankings_core::models::{referenced_athlete_ids, Division, Profile};

use crate::config::SourceConfig;
use crate::error::{PartialEnrichmentFailure, ProfileError};
use crate::extract::Extractor;
use crate::fetch::Fetcher;

pub struct Enricher {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    source: SourceConfig,
}

impl Enricher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        source: SourceConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            source,
        }
    }

    /// Fetch and extract the profile of every champion and contender.
    ///
    /// The result is keyed by athlete ID and independent of the order in
    /// which fetches complete.
    pub async fn enrich(
        &self,
        divisions: &BTreeMap<String, Division>,
    ) -> Result<BTreeMap<String, Profile>, PartialEnrichmentFailure> {
        let ids = referenced_athlete_ids(divisions);
        let width = self.source.concurrency.max(1);
        info!(athletes = ids.len(), concurrency = width, "enriching athlete profiles");

        let results: Vec<(String, Result<Profile, ProfileError>)> = stream::iter(ids)
            .map(|id| async move {
                let result = self.fetch_profile(&id).await;
                (id, result)
            })
            .buffer_unordered(width)
            .collect()
            .await;

        let mut profiles = BTreeMap::new();
        let mut failures = BTreeMap::new();
        for (id, result) in results {
            match result {
                Ok(profile) => {
                    profiles.insert(id, profile);
                }
                Err(e) => {
                    warn!(athlete = %id, error = %e, "profile enrichment failed");
                    failures.insert(id, e);
                }
            }
        }

        if !failures.is_empty() {
            return Err(PartialEnrichmentFailure { failures });
        }
        Ok(profiles)
    }

    async fn fetch_profile(&self, athlete_id: &str) -> Result<Profile, ProfileError> {
        let url = self.source.profile_url(athlete_id);
        let body = self.fetcher.fetch(&url).await?;
        let profile = self.extractor.parse_profile_document(&body, athlete_id)?;
        debug!(athlete = athlete_id, "profile extracted");
        Ok(profile)
    }
}
