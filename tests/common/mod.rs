//! Local stand-in for the remote rankings site, shared by integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;

pub const RANKINGS_HTML: &str = include_str!("../fixtures/rankings.html");
pub const JON_JONES_HTML: &str = include_str!("../fixtures/profile_jon_jones.html");

/// Every athlete linked from `rankings.html`.
pub const RANKED_ATHLETES: [&str; 8] = [
    "alex-pereira",
    "ciryl-gane",
    "jiri-prochazka",
    "jon-jones",
    "magomed-ankalaev",
    "tatiana-suarez",
    "tom-aspinall",
    "zhang-weili",
];

#[derive(Default)]
pub struct SourceState {
    pub rankings_hits: AtomicUsize,
    pub profile_hits: AtomicUsize,
    failing: Mutex<HashSet<String>>,
}

impl SourceState {
    /// Make the profile page of `athlete_id` answer 503.
    pub fn fail(&self, athlete_id: &str) {
        self.failing.lock().unwrap().insert(athlete_id.to_string());
    }

    pub fn rankings_hits(&self) -> usize {
        self.rankings_hits.load(Ordering::SeqCst)
    }
}

pub struct FixtureSource {
    pub addr: SocketAddr,
    pub state: Arc<SourceState>,
}

impl FixtureSource {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A config pointing at this source and storing under `data_dir`.
    pub fn write_config(&self, dir: &Path, backend: &str) -> PathBuf {
        let data_file = match backend {
            "sqlite" => dir.join("data/rankings.db"),
            _ => dir.join("data/rankings.json"),
        };
        let content = format!(
            r#"[source]
rankings_url = "{base}/rankings"
base_url = "{base}"
athlete_url = "{base}/athlete"
timeout_ms = 5000
concurrency = 3

[cache]
backend = "{backend}"
path = "{path}"
stale_after_secs = 86400

[server]
bind = "127.0.0.1:0"
"#,
            base = self.base_url(),
            backend = backend,
            path = data_file.display(),
        );
        let config_dir = dir.join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("rankings.toml");
        std::fs::write(&config_path, content).unwrap();
        config_path
    }
}

/// Minimal profile page for athletes without a dedicated fixture.
pub fn generated_profile(athlete_id: &str) -> String {
    let name = athlete_id
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"<html><body>
        <div class="hero-profile">
          <h1 class="hero-profile__name">{name}</h1>
          <p class="hero-profile__division-body">12-3-0 (W-L-D)</p>
        </div>
        <div class="c-bio__field">
          <div class="c-bio__label">Place of Birth</div>
          <div class="c-bio__text">Somewhere, Testland</div>
        </div>
        </body></html>"#
    )
}

async fn rankings(State(state): State<Arc<SourceState>>) -> Html<&'static str> {
    state.rankings_hits.fetch_add(1, Ordering::SeqCst);
    Html(RANKINGS_HTML)
}

async fn athlete(
    State(state): State<Arc<SourceState>>,
    UrlPath(athlete_id): UrlPath<String>,
) -> Response {
    state.profile_hits.fetch_add(1, Ordering::SeqCst);
    if state.failing.lock().unwrap().contains(&athlete_id) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if athlete_id == "jon-jones" {
        return Html(JON_JONES_HTML.to_string()).into_response();
    }
    Html(generated_profile(&athlete_id)).into_response()
}

/// Serve the fixture site on an ephemeral port.
pub async fn start_source() -> FixtureSource {
    let state = Arc::new(SourceState::default());
    let app = Router::new()
        .route("/rankings", get(rankings))
        .route("/athlete/{athlete_id}", get(athlete))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FixtureSource { addr, state }
}
