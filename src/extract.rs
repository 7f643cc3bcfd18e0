//! Structured extraction of rankings and athlete profiles from HTML.
//!
//! Extraction is pure and synchronous: a document string goes in, typed
//! records come out. The ingestion pipeline only sees the [`Extractor`]
//! trait, so it can be driven by canned documents in tests and the markup
//! rules below can be swapped without touching the pipeline.
//!
//! # Rankings listing
//!
//! Each `.view-grouping` element is one division:
//!
//! | Field | Source |
//! |-------|--------|
//! | division title | `h4` text (required) |
//! | champion | `h5 a[href]` (required) |
//! | champion image | `.image-style-athlete-profile-listing-medium-1x` `src` |
//! | contenders | `.views-table tr a[href]`, in row order |
//!
//! The athlete ID is the last non-empty path segment of the athlete's
//! profile link (`/athlete/jon-jones` → `jon-jones`). Query strings and
//! trailing slashes are ignored.
//!
//! A group missing its title or champion is skipped with a warning, as is a
//! contender row whose link yields no ID. A document with no groups at all,
//! or with no usable group, is a [`MalformedDocument`].
//!
//! # Athlete profile
//!
//! The page must contain a `.hero-profile` header; everything else is
//! optional and falls back to an empty string or zero.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use rankings_core::models::{referenced_athlete_ids, CompetitorRef, Division, Profile, Stat};

use crate::error::MalformedDocument;

/// Divisions extracted from one rankings listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingsListing {
    pub divisions: BTreeMap<String, Division>,
    /// Division keys in document order.
    pub order: Vec<String>,
}

impl RankingsListing {
    pub fn athlete_ids(&self) -> BTreeSet<String> {
        referenced_athlete_ids(&self.divisions)
    }
}

/// Turns source documents into typed records.
pub trait Extractor: Send + Sync {
    fn parse_rankings_document(&self, doc: &str) -> Result<RankingsListing, MalformedDocument>;

    /// Parse one athlete page. `athlete_id` comes from the rankings link;
    /// the page itself is not trusted to state it.
    fn parse_profile_document(
        &self,
        doc: &str,
        athlete_id: &str,
    ) -> Result<Profile, MalformedDocument>;
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector '{}': {:?}", css, e))
}

static RANKING_GROUP: Lazy<Selector> = Lazy::new(|| selector(".view-grouping"));
static GROUP_TITLE: Lazy<Selector> = Lazy::new(|| selector("h4"));
static CHAMPION_LINK: Lazy<Selector> = Lazy::new(|| selector("h5 a[href]"));
static CHAMPION_IMAGE: Lazy<Selector> =
    Lazy::new(|| selector(".image-style-athlete-profile-listing-medium-1x"));
static CONTENDER_ROW: Lazy<Selector> = Lazy::new(|| selector(".views-table tr"));
static ROW_LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

static PROFILE_HERO: Lazy<Selector> = Lazy::new(|| selector(".hero-profile"));
static PROFILE_NAME: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__name"));
static PROFILE_NICKNAME: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__nickname"));
static PROFILE_DIVISION: Lazy<Selector> =
    Lazy::new(|| selector(".hero-profile__division-title"));
static PROFILE_RECORD: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__division-body"));
static PROFILE_IMAGE: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__image"));
static PROMOTED_STAT: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__stat"));
static PROMOTED_STAT_VALUE: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__stat-numb"));
static PROMOTED_STAT_LABEL: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__stat-text"));
static SOCIAL_LINK: Lazy<Selector> = Lazy::new(|| selector(".hero-profile__social a[href]"));
static ACCURACY_BLOCK: Lazy<Selector> = Lazy::new(|| selector(".c-overlap__inner"));
static ACCURACY_TITLE: Lazy<Selector> = Lazy::new(|| selector(".e-t3"));
static ACCURACY_VALUE: Lazy<Selector> = Lazy::new(|| selector(".e-chart-circle__percent"));
static FIGHT_STAT: Lazy<Selector> = Lazy::new(|| selector(".c-stat-compare__group"));
static FIGHT_STAT_VALUE: Lazy<Selector> = Lazy::new(|| selector(".c-stat-compare__number"));
static FIGHT_STAT_LABEL: Lazy<Selector> = Lazy::new(|| selector(".c-stat-compare__label"));
static BIO_FIELD: Lazy<Selector> = Lazy::new(|| selector(".c-bio__field"));
static BIO_LABEL: Lazy<Selector> = Lazy::new(|| selector(".c-bio__label"));
static BIO_TEXT: Lazy<Selector> = Lazy::new(|| selector(".c-bio__text"));

static RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*-\s*(\d+)\s*-\s*(\d+)").unwrap_or_else(|e| panic!("record regex: {}", e))
});

/// Extractor for ufc.com ranking and athlete pages.
pub struct UfcExtractor {
    /// Base for resolving relative links and image sources.
    base_url: Url,
}

impl UfcExtractor {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
        })
    }

    fn resolve(&self, href: &str) -> Option<String> {
        self.base_url.join(href).ok().map(String::from)
    }

    fn athlete_id_from_href(&self, href: &str) -> Option<String> {
        let url = self.base_url.join(href).ok()?;
        url.path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(str::to_string)
    }

    fn competitor_from_link(&self, link: ElementRef) -> Option<CompetitorRef> {
        let href = link.value().attr("href")?;
        let athlete_id = self.athlete_id_from_href(href)?;
        Some(CompetitorRef {
            athlete_id,
            name: text_of(link),
            image: None,
        })
    }

    fn parse_group(&self, group: ElementRef) -> Result<Division, MalformedDocument> {
        let title = first_text(group, &GROUP_TITLE);
        let key = normalize_division_key(&title);
        if key.is_empty() {
            return Err(MalformedDocument::new("ranking group", "division title"));
        }
        let context = format!("division '{}'", title);

        let champion_link = group
            .select(&CHAMPION_LINK)
            .next()
            .ok_or_else(|| MalformedDocument::new(&context, "champion profile link"))?;
        let mut champion = self
            .competitor_from_link(champion_link)
            .ok_or_else(|| MalformedDocument::new(&context, "champion athlete id"))?;
        champion.image = group
            .select(&CHAMPION_IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| self.resolve(src));

        let mut contenders = Vec::new();
        for (row_index, row) in group.select(&CONTENDER_ROW).enumerate() {
            let Some(link) = row.select(&ROW_LINK).next() else {
                debug!(division = %key, row = row_index, "ranking row has no athlete link");
                continue;
            };
            match self.competitor_from_link(link) {
                Some(contender) => contenders.push(contender),
                None => warn!(
                    division = %key,
                    row = row_index,
                    href = ?link.value().attr("href"),
                    "skipping contender without athlete id"
                ),
            }
        }

        Ok(Division {
            title: key,
            champion,
            contenders,
        })
    }

    fn social_links(&self, root: ElementRef) -> BTreeMap<String, String> {
        let mut links = BTreeMap::new();
        for link in root.select(&SOCIAL_LINK) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            // Relative hrefs are in-page anchors, not social profiles
            let Ok(url) = Url::parse(href) else {
                continue;
            };
            if let Some(platform) = url.host_str().and_then(platform_from_host) {
                links.entry(platform).or_insert_with(|| href.to_string());
            }
        }
        links
    }
}

impl Extractor for UfcExtractor {
    fn parse_rankings_document(&self, doc: &str) -> Result<RankingsListing, MalformedDocument> {
        let html = Html::parse_document(doc);
        let groups: Vec<ElementRef> = html.select(&RANKING_GROUP).collect();
        if groups.is_empty() {
            return Err(MalformedDocument::new(
                "rankings document",
                "ranking groups (.view-grouping)",
            ));
        }

        let mut divisions = BTreeMap::new();
        let mut order = Vec::new();
        for (index, group) in groups.into_iter().enumerate() {
            match self.parse_group(group) {
                Ok(division) => {
                    if divisions.contains_key(&division.title) {
                        warn!(division = %division.title, "duplicate division key, keeping the first");
                        continue;
                    }
                    order.push(division.title.clone());
                    divisions.insert(division.title.clone(), division);
                }
                Err(e) => warn!(group = index, error = %e, "skipping malformed ranking group"),
            }
        }

        if divisions.is_empty() {
            return Err(MalformedDocument::new(
                "rankings document",
                "a ranking group with both a title and a champion",
            ));
        }

        debug!(divisions = divisions.len(), "parsed rankings document");
        Ok(RankingsListing { divisions, order })
    }

    fn parse_profile_document(
        &self,
        doc: &str,
        athlete_id: &str,
    ) -> Result<Profile, MalformedDocument> {
        if athlete_id.trim().is_empty() {
            return Err(MalformedDocument::new("athlete profile", "athlete id"));
        }
        let context = format!("profile '{}'", athlete_id);

        let html = Html::parse_document(doc);
        let root = html.root_element();
        let hero = root
            .select(&PROFILE_HERO)
            .next()
            .ok_or_else(|| MalformedDocument::new(&context, "profile header (.hero-profile)"))?;

        let (wins, losses, draws) = parse_record(&first_text(hero, &PROFILE_RECORD)).unwrap_or_default();

        let mut striking_accuracy = String::new();
        let mut grappling_accuracy = String::new();
        for block in root.select(&ACCURACY_BLOCK) {
            let title = first_text(block, &ACCURACY_TITLE).to_lowercase();
            let value = first_text(block, &ACCURACY_VALUE);
            if title.contains("striking") {
                striking_accuracy = value;
            } else if title.contains("takedown") || title.contains("grappling") {
                grappling_accuracy = value;
            }
        }

        let bio = bio_fields(root);
        let country = bio
            .get("placeOfBirth")
            .map(|place| country_from_birthplace(place))
            .unwrap_or_default();

        let nickname = first_text(hero, &PROFILE_NICKNAME)
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}'))
            .trim()
            .to_string();

        Ok(Profile {
            athlete_id: athlete_id.to_string(),
            name: first_text(hero, &PROFILE_NAME),
            nickname,
            country,
            wins,
            losses,
            draws,
            division: first_text(hero, &PROFILE_DIVISION),
            striking_accuracy,
            grappling_accuracy,
            fighting_stats: stats(root, &FIGHT_STAT, &FIGHT_STAT_LABEL, &FIGHT_STAT_VALUE),
            promoted_stats: stats(root, &PROMOTED_STAT, &PROMOTED_STAT_LABEL, &PROMOTED_STAT_VALUE),
            social_media_links: self.social_links(root),
            image: hero
                .select(&PROFILE_IMAGE)
                .next()
                .and_then(|img| img.value().attr("src"))
                .and_then(|src| self.resolve(src)),
            bio,
        })
    }
}

/// Element text with whitespace runs collapsed to single spaces.
fn text_of(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(scope: ElementRef, selector: &Selector) -> String {
    scope.select(selector).next().map(text_of).unwrap_or_default()
}

fn stats(root: ElementRef, group: &Selector, label: &Selector, value: &Selector) -> Vec<Stat> {
    root.select(group)
        .filter_map(|g| {
            let stat = first_text(g, label);
            if stat.is_empty() {
                return None;
            }
            Some(Stat {
                stat,
                data: first_text(g, value),
            })
        })
        .collect()
}

fn bio_fields(root: ElementRef) -> BTreeMap<String, String> {
    root.select(&BIO_FIELD)
        .filter_map(|field| {
            let key = camel_case(&first_text(field, &BIO_LABEL));
            if key.is_empty() {
                return None;
            }
            Some((key, first_text(field, &BIO_TEXT)))
        })
        .collect()
}

fn country_from_birthplace(place: &str) -> String {
    place
        .rsplit(',')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// `twitter.com` → `twitter`, `www.instagram.com` → `instagram`.
fn platform_from_host(host: &str) -> Option<String> {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let label = match labels.len() {
        0 => return None,
        1 => labels[0],
        n => labels[n - 2],
    };
    Some(label.to_lowercase())
}

/// Normalize a division title into its map key.
///
/// Lowercases, turns spaces and hyphens into single `-`, drops punctuation:
/// `"Women's Strawweight"` → `"womens-strawweight"`. Titles differing only in
/// case or spacing map to the same key.
pub fn normalize_division_key(title: &str) -> String {
    let mut key = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            key.push(c);
        } else if (c.is_whitespace() || c == '-') && !key.is_empty() && !key.ends_with('-') {
            key.push('-');
        }
    }
    while key.ends_with('-') {
        key.pop();
    }
    key
}

/// Camel-case a bio label: `"Place of Birth"` → `"placeOfBirth"`.
pub fn camel_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let words = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty());
    for (i, word) in words.enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// First `W-L-D` integer triple in `text`: `"27-1-0 (W-L-D)"` → `(27, 1, 0)`.
pub fn parse_record(text: &str) -> Option<(u32, u32, u32)> {
    let caps = RECORD_RE.captures(text)?;
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    Some((field(1)?, field(2)?, field(3)?))
}
