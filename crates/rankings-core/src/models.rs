//! Core data models for the rankings snapshot.
//!
//! A [`Snapshot`] is built wholesale by one ingestion run and replaced
//! wholesale in the cache. Divisions only hold [`CompetitorRef`]s; the
//! detailed [`Profile`] for each competitor lives once in
//! [`Snapshot::athletes`] and is joined on `athlete_id` at read time, so the
//! persisted form never duplicates profile data across divisions.
//!
//! All types serialize with camelCase keys, matching the persisted JSON shape:
//!
//! ```json
//! {
//!   "divisions": { "heavyweight": { "title": "heavyweight", "champion": { ... }, "contenders": [ ... ] } },
//!   "divisionOrder": ["heavyweight"],
//!   "athletes": { "jon-jones": { "athleteId": "jon-jones", "wins": 27, ... } },
//!   "lastUpdated": "Sat, 17 Oct 2026 09:00:00 GMT"
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A ranked competitor as it appears inside a division listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorRef {
    /// Stable join key into [`Snapshot::athletes`].
    pub athlete_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One weight division: its champion and the ranked contenders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    /// Normalized division key (lowercase, hyphenated).
    pub title: String,
    pub champion: CompetitorRef,
    /// Rank order; index 0 is the next contender.
    #[serde(default)]
    pub contenders: Vec<CompetitorRef>,
}

impl Division {
    /// Champion first, then contenders in rank order.
    pub fn competitors(&self) -> impl Iterator<Item = &CompetitorRef> {
        std::iter::once(&self.champion).chain(self.contenders.iter())
    }
}

/// A labelled statistic, e.g. `{ "stat": "Sig. Str. Landed", "data": "4.29" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub stat: String,
    pub data: String,
}

/// Detailed athlete profile extracted from the athlete's own page.
///
/// Fields missing from the source page are empty strings or zero; only the
/// `athlete_id` is guaranteed to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub athlete_id: String,
    pub name: String,
    pub nickname: String,
    pub country: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub division: String,
    pub striking_accuracy: String,
    pub grappling_accuracy: String,
    pub fighting_stats: Vec<Stat>,
    pub promoted_stats: Vec<Stat>,
    pub social_media_links: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Free-form bio fields keyed by camelCased label (`placeOfBirth`, `age`, ...).
    pub bio: BTreeMap<String, String>,
}

impl Profile {
    /// Win-loss-draw record in the source's `W-L-D` notation.
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.draws)
    }
}

/// The complete ranking and profile dataset for one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub divisions: BTreeMap<String, Division>,
    /// Division keys in the order the source lists them.
    #[serde(default)]
    pub division_order: Vec<String>,
    pub athletes: BTreeMap<String, Profile>,
    #[serde(with = "crate::timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl Snapshot {
    /// Age of the snapshot relative to `now`. Negative if stamped in the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_updated
    }

    /// A snapshot is stale once its age reaches `stale_after`.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.age(now) >= stale_after
    }

    /// Athlete IDs referenced by a division but absent from `athletes`.
    ///
    /// Empty for every snapshot produced by a successful ingestion.
    pub fn missing_athletes(&self) -> Vec<String> {
        referenced_athlete_ids(&self.divisions)
            .into_iter()
            .filter(|id| !self.athletes.contains_key(id))
            .collect()
    }

    /// Divisions in source order. Keys missing from `division_order` follow
    /// in key order.
    pub fn ordered_divisions(&self) -> Vec<(&str, &Division)> {
        let mut out: Vec<(&str, &Division)> = self
            .division_order
            .iter()
            .filter_map(|key| self.divisions.get_key_value(key))
            .map(|(k, d)| (k.as_str(), d))
            .collect();
        for (key, division) in &self.divisions {
            if !self.division_order.iter().any(|k| k == key) {
                out.push((key.as_str(), division));
            }
        }
        out
    }

    /// True when both snapshots hold the same rankings and profiles,
    /// ignoring `last_updated`.
    pub fn same_content(&self, other: &Snapshot) -> bool {
        self.divisions == other.divisions
            && self.division_order == other.division_order
            && self.athletes == other.athletes
    }
}

/// Deduplicated set of athlete IDs referenced as champion or contender.
pub fn referenced_athlete_ids(divisions: &BTreeMap<String, Division>) -> BTreeSet<String> {
    divisions
        .values()
        .flat_map(|d| d.competitors())
        .map(|c| c.athlete_id.clone())
        .collect()
}
