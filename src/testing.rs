//! Canned documents and an in-memory fetcher for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::fetch::Fetcher;

pub(crate) const SOURCE: &str = "http://source.test";

pub(crate) fn source_config() -> SourceConfig {
    SourceConfig {
        rankings_url: format!("{}/rankings", SOURCE),
        base_url: SOURCE.to_string(),
        athlete_url: format!("{}/athlete", SOURCE),
        timeout_ms: 1_000,
        concurrency: 4,
        user_agent: "test".to_string(),
    }
}

pub(crate) fn rankings_url() -> String {
    format!("{}/rankings", SOURCE)
}

pub(crate) fn profile_url(id: &str) -> String {
    format!("{}/athlete/{}", SOURCE, id)
}

/// A rankings listing with one group per `(title, champion, contenders)`.
pub(crate) fn rankings_page(divisions: &[(&str, &str, &[&str])]) -> String {
    let mut html = String::from("<html><body>");
    for (title, champion, contenders) in divisions {
        html.push_str(&format!(
            r#"<div class="view-grouping"><h4>{title}</h4><h5><a href="/athlete/{champion}">{champion}</a></h5><table class="views-table">"#
        ));
        for contender in contenders.iter() {
            html.push_str(&format!(
                r#"<tr><td><a href="/athlete/{contender}">{contender}</a></td></tr>"#
            ));
        }
        html.push_str("</table></div>");
    }
    html.push_str("</body></html>");
    html
}

pub(crate) fn profile_page(name: &str, record: &str) -> String {
    format!(
        r#"<html><body><div class="hero-profile">
            <h1 class="hero-profile__name">{name}</h1>
            <p class="hero-profile__division-body">{record} (W-L-D)</p>
        </div></body></html>"#
    )
}

/// Serves pages from a map and records every request.
pub(crate) struct StaticFetcher {
    pages: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticFetcher {
    pub(crate) fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every fetch sleeps for `delay`, so concurrent fetches overlap.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.set_page(url, body);
        self
    }

    pub(crate) fn set_page(&self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.lock().unwrap().insert(url.into(), body.into());
    }

    pub(crate) fn fail(&self, url: impl Into<String>) {
        self.failing.lock().unwrap().insert(url.into());
    }

    pub(crate) fn recover(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(url) {
            return Err(FetchError::new(url, "HTTP 503 Service Unavailable"));
        }
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(url, "HTTP 404 Not Found"))
    }
}

/// Fetcher serving a heavyweight division (`jon-jones` champion,
/// `tom-aspinall` contender) and both profiles.
pub(crate) fn heavyweight_fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with_page(
            rankings_url(),
            rankings_page(&[("Heavyweight", "jon-jones", &["tom-aspinall"])]),
        )
        .with_page(profile_url("jon-jones"), profile_page("Jon Jones", "27-1-0"))
        .with_page(
            profile_url("tom-aspinall"),
            profile_page("Tom Aspinall", "15-3-0"),
        )
}
