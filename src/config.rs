//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that points at the public UFC site, caches in
//! `./data/rankings.json`, and refreshes once a day.
//!
//! ```toml
//! [source]
//! rankings_url = "https://www.ufc.com/rankings"
//! base_url = "https://www.ufc.com"
//! athlete_url = "https://www.ufc.com/athlete"
//! timeout_ms = 15000
//! concurrency = 8
//!
//! [cache]
//! backend = "json"          # or "sqlite"
//! path = "./data/rankings.json"
//! stale_after_secs = 86400
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Remote source settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Ranking listing page.
    #[serde(default = "default_rankings_url")]
    pub rankings_url: String,
    /// Base for resolving relative links found in the listing.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Profile pages live at `{athlete_url}/{athlete_id}`.
    #[serde(default = "default_athlete_url")]
    pub athlete_url: String,
    /// Deadline for a single fetch, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum profile fetches in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            rankings_url: default_rankings_url(),
            base_url: default_base_url(),
            athlete_url: default_athlete_url(),
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Profile page URL for an athlete.
    pub fn profile_url(&self, athlete_id: &str) -> String {
        format!("{}/{}", self.athlete_url.trim_end_matches('/'), athlete_id)
    }
}

fn default_rankings_url() -> String {
    "https://www.ufc.com/rankings".to_string()
}
fn default_base_url() -> String {
    "https://www.ufc.com".to_string()
}
fn default_athlete_url() -> String {
    "https://www.ufc.com/athlete".to_string()
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_concurrency() -> usize {
    8
}
fn default_user_agent() -> String {
    format!("ufc-rankings/{}", env!("CARGO_PKG_VERSION"))
}

/// Snapshot persistence backend.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl CacheConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/rankings.json")
}
fn default_stale_after_secs() -> u64 {
    24 * 60 * 60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    let source = &config.source;

    for (name, value) in [
        ("source.rankings_url", &source.rankings_url),
        ("source.base_url", &source.base_url),
        ("source.athlete_url", &source.athlete_url),
    ] {
        let url = Url::parse(value).with_context(|| format!("{} is not a valid URL", name))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("{} must be an http(s) URL, got '{}'", name, value);
        }
    }

    // An unbounded fetch would stall the whole enrichment batch
    if source.timeout_ms == 0 {
        bail!("source.timeout_ms must be > 0");
    }

    if source.concurrency == 0 {
        bail!("source.concurrency must be >= 1");
    }

    if config.cache.stale_after_secs == 0 {
        bail!("cache.stale_after_secs must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        validate(&config).unwrap();
        assert_eq!(config.source.rankings_url, "https://www.ufc.com/rankings");
        assert_eq!(config.cache.backend, CacheBackend::Json);
        assert_eq!(config.cache.stale_after(), Duration::from_secs(86_400));
        assert_eq!(config.source.concurrency, 8);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
[source]
concurrency = 2

[cache]
backend = "sqlite"
path = "/tmp/r.sqlite"
"#,
        )
        .unwrap();
        validate(&config).unwrap();
        assert_eq!(config.source.concurrency, 2);
        assert_eq!(config.source.timeout_ms, 15_000);
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_profile_url_joins_without_double_slash() {
        let mut source = SourceConfig::default();
        source.athlete_url = "http://localhost:9000/athlete/".into();
        assert_eq!(
            source.profile_url("jon-jones"),
            "http://localhost:9000/athlete/jon-jones"
        );
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config: Config = toml::from_str("[source]\ntimeout_ms = 0\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config: Config = toml::from_str("[source]\nconcurrency = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config: Config =
            toml::from_str("[source]\nrankings_url = \"ftp://example.com/r\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let parsed: Result<Config, _> = toml::from_str("[cache]\nbackend = \"redis\"\n");
        assert!(parsed.is_err());
    }
}
