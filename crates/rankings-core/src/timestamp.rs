//! HTTP-date timestamps (`Sun, 06 Nov 1994 08:49:37 GMT`).
//!
//! Persisted snapshots store `lastUpdated` in this format. It has one-second
//! resolution, so timestamps are truncated to whole seconds when stamped;
//! that keeps the JSON round-trip lossless.
//!
//! Use as a serde field adapter:
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Stamped {
//!     #[serde(with = "rankings_core::timestamp")]
//!     at: DateTime<Utc>,
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// `strftime` pattern for an IMF-fixdate (RFC 7231 §7.1.1.1).
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn format_http_date(ts: &DateTime<Utc>) -> String {
    ts.format(HTTP_DATE_FORMAT).to_string()
}

pub fn parse_http_date(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), HTTP_DATE_FORMAT).map(|naive| naive.and_utc())
}

/// Current time at the resolution the persisted format can carry.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_http_date(ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_http_date(&raw)
        .map_err(|e| serde::de::Error::custom(format!("invalid HTTP date '{}': {}", raw, e)))
}
