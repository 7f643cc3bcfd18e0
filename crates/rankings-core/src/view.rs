//! Read-time views that join profile data into ranking records.
//!
//! These are never persisted. The canonical [`Snapshot`] stays normalized and
//! the views are recomputed per request.

use serde::Serialize;

use crate::models::{CompetitorRef, Division, Profile, Snapshot};

/// A ranked competitor with selected profile fields spliced in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedCompetitor {
    pub athlete_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedDivision {
    pub title: String,
    pub champion: MergedCompetitor,
    pub contenders: Vec<MergedCompetitor>,
}

/// Row for athlete listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteSummary {
    pub athlete_id: String,
    pub name: String,
    pub nickname: String,
    pub division: String,
    pub country: String,
}

impl From<&Profile> for AthleteSummary {
    fn from(p: &Profile) -> Self {
        Self {
            athlete_id: p.athlete_id.clone(),
            name: p.name.clone(),
            nickname: p.nickname.clone(),
            division: p.division.clone(),
            country: p.country.clone(),
        }
    }
}

pub fn merge_competitor(snapshot: &Snapshot, competitor: &CompetitorRef) -> MergedCompetitor {
    let profile = snapshot.athletes.get(&competitor.athlete_id);
    MergedCompetitor {
        athlete_id: competitor.athlete_id.clone(),
        name: competitor.name.clone(),
        image: competitor.image.clone(),
        nickname: profile
            .map(|p| p.nickname.clone())
            .filter(|n| !n.is_empty()),
        country: profile.map(|p| p.country.clone()),
        record: profile.map(Profile::record),
    }
}

pub fn merge_division(snapshot: &Snapshot, division: &Division) -> MergedDivision {
    MergedDivision {
        title: division.title.clone(),
        champion: merge_competitor(snapshot, &division.champion),
        contenders: division
            .contenders
            .iter()
            .map(|c| merge_competitor(snapshot, c))
            .collect(),
    }
}

/// All divisions merged, in source order.
pub fn merged_divisions(snapshot: &Snapshot) -> Vec<(String, MergedDivision)> {
    snapshot
        .ordered_divisions()
        .into_iter()
        .map(|(key, d)| (key.to_string(), merge_division(snapshot, d)))
        .collect()
}

pub fn athlete_summaries(snapshot: &Snapshot) -> Vec<AthleteSummary> {
    snapshot.athletes.values().map(AthleteSummary::from).collect()
}
