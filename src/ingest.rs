//! Ingestion pipeline orchestration.
//!
//! One ingestion runs: rankings fetch → rankings extraction → profile
//! enrichment → snapshot assembly. Any stage failing fails the whole run;
//! the pipeline itself never persists anything, so a failed run leaves
//! every store untouched.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use rankings_core::models::Snapshot;
use rankings_core::timestamp;

use crate::cache::{CacheState, SnapshotCache};
use crate::config::{Config, SourceConfig};
use crate::enrich::Enricher;
use crate::error::IngestError;
use crate::extract::{Extractor, UfcExtractor};
use crate::fetch::{Fetcher, HttpFetcher};

pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    enricher: Enricher,
    rankings_url: String,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        source: &SourceConfig,
    ) -> Self {
        Self {
            enricher: Enricher::new(fetcher.clone(), extractor.clone(), source.clone()),
            fetcher,
            extractor,
            rankings_url: source.rankings_url.clone(),
        }
    }

    /// Pipeline talking to the configured remote source over HTTP.
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::from_config(source)?);
        let extractor = Arc::new(UfcExtractor::new(&source.base_url)?);
        Ok(Self::new(fetcher, extractor, source))
    }

    /// Run one complete ingestion and return the new snapshot.
    ///
    /// The snapshot is stamped with the current time (whole seconds) and
    /// every athlete it references has a profile.
    pub async fn ingest(&self) -> Result<Snapshot, IngestError> {
        info!(url = %self.rankings_url, "fetching rankings");
        let body = self.fetcher.fetch(&self.rankings_url).await?;
        let listing = self.extractor.parse_rankings_document(&body)?;
        info!(divisions = listing.divisions.len(), "rankings extracted");

        let athletes = self.enricher.enrich(&listing.divisions).await?;

        let snapshot = Snapshot {
            divisions: listing.divisions,
            division_order: listing.order,
            athletes,
            last_updated: timestamp::now(),
        };
        info!(
            divisions = snapshot.divisions.len(),
            athletes = snapshot.athletes.len(),
            last_updated = %timestamp::format_http_date(&snapshot.last_updated),
            "ingestion complete"
        );
        Ok(snapshot)
    }
}

/// Run the sync command: ingest unless the stored snapshot is still fresh
/// (or always, with `force`), then print a summary.
pub async fn run_sync(config: &Config, force: bool) -> Result<()> {
    let cache = SnapshotCache::from_config(config).await?;

    if !force {
        if let CacheState::Fresh { last_updated, .. } = cache.state().await {
            println!("sync {}", cache.store().describe());
            println!(
                "  snapshot is fresh (updated {}), nothing to do",
                timestamp::format_http_date(&last_updated)
            );
            println!("  use --force to ingest anyway");
            println!("ok");
            return Ok(());
        }
    }

    let snapshot = cache.refresh().await?;

    println!("sync {}", cache.store().describe());
    println!("  divisions: {}", snapshot.divisions.len());
    println!("  athletes: {}", snapshot.athletes.len());
    println!(
        "  last updated: {}",
        timestamp::format_http_date(&snapshot.last_updated)
    );
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        heavyweight_fetcher, profile_url, rankings_url, source_config, StaticFetcher, SOURCE,
    };

    fn pipeline(fetcher: Arc<StaticFetcher>) -> Pipeline {
        Pipeline::new(
            fetcher,
            Arc::new(UfcExtractor::new(SOURCE).unwrap()),
            &source_config(),
        )
    }

    #[tokio::test]
    async fn test_ingest_builds_complete_snapshot() {
        let fetcher = Arc::new(heavyweight_fetcher());
        let snapshot = pipeline(fetcher.clone()).ingest().await.unwrap();

        assert_eq!(snapshot.divisions.len(), 1);
        let heavyweight = &snapshot.divisions["heavyweight"];
        assert_eq!(heavyweight.champion.athlete_id, "jon-jones");
        assert_eq!(heavyweight.contenders[0].athlete_id, "tom-aspinall");

        assert_eq!(snapshot.athletes.len(), 2);
        assert_eq!(snapshot.athletes["jon-jones"].wins, 27);
        assert_eq!(snapshot.athletes["tom-aspinall"].wins, 15);
        assert!(snapshot.missing_athletes().is_empty());
        assert_eq!(snapshot.division_order, vec!["heavyweight"]);
        assert_eq!(fetcher.calls_to(&rankings_url()), 1);
    }

    #[tokio::test]
    async fn test_reingest_of_unchanged_source_is_identical() {
        let fetcher = Arc::new(heavyweight_fetcher());
        let pipeline = pipeline(fetcher);

        let first = pipeline.ingest().await.unwrap();
        let second = pipeline.ingest().await.unwrap();
        assert!(first.same_content(&second));
        assert!(second.last_updated >= first.last_updated);
    }

    #[tokio::test]
    async fn test_rankings_fetch_failure_skips_enrichment() {
        let fetcher = Arc::new(heavyweight_fetcher());
        fetcher.fail(rankings_url());

        let err = pipeline(fetcher.clone()).ingest().await.unwrap_err();
        assert!(matches!(err, IngestError::Fetch(_)));
        assert_eq!(fetcher.calls_to(&profile_url("jon-jones")), 0);
    }

    #[tokio::test]
    async fn test_unparseable_rankings_is_malformed() {
        let fetcher = Arc::new(
            StaticFetcher::new().with_page(rankings_url(), "<html><body>maintenance</body></html>"),
        );
        let err = pipeline(fetcher.clone()).ingest().await.unwrap_err();
        assert!(matches!(err, IngestError::Malformed(_)));
        assert_eq!(fetcher.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_profile_failure_fails_ingestion() {
        let fetcher = Arc::new(heavyweight_fetcher());
        fetcher.fail(profile_url("jon-jones"));

        let err = pipeline(fetcher).ingest().await.unwrap_err();
        match err {
            IngestError::Enrichment(failure) => {
                assert_eq!(failure.failed_ids(), vec!["jon-jones".to_string()]);
            }
            other => panic!("expected enrichment failure, got {:?}", other),
        }
    }
}
