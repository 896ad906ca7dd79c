//! Wire types exchanged with the memo backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend-assigned memo identifier (a UUID string on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoId(String);

impl MemoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MemoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A memo as returned by search, read and update endpoints.
///
/// Search hits carry a relevance `score`; plain reads report `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoRecord {
    #[serde(rename = "uuid")]
    pub id: MemoId,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub score: f64,
}

/// One search hit. Identity is [`MemoRecord::id`].
pub type SearchResult = MemoRecord;

/// Payload for `POST /memo`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoDraft {
    pub category: String,
    pub title: String,
    pub tags: Vec<String>,
    pub body: String,
}

impl MemoDraft {
    /// Builds a draft from form fields; `tags` is a comma-separated list.
    pub fn from_form(category: &str, title: &str, tags: &str, body: &str) -> Self {
        Self {
            category: category.to_string(),
            title: title.to_string(),
            tags: parse_tags(tags),
            body: body.to_string(),
        }
    }

    /// Returns `true` if every field is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.category.trim().is_empty()
            && self.title.trim().is_empty()
            && self.body.trim().is_empty()
            && self.tags.iter().all(|t| t.trim().is_empty())
    }
}

/// Splits a comma-separated tag list, trimming entries and dropping empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Payload for `POST /memo/{uuid}` (update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoUpdate {
    pub title: String,
    pub body: String,
}

/// Response of `POST /memo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedMemo {
    pub uuid: MemoId,
    #[serde(default)]
    pub status: String,
}

/// `{status}` acknowledgement returned by delete and admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
}

/// Indexing job progress (`GET /admin/progress`).
///
/// `total == 0` means the job has not measured its workload yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct JobProgress {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
}

impl JobProgress {
    pub const fn new(processed: u64, total: u64) -> Self {
        Self { processed, total }
    }

    /// `total > 0 && processed >= total`.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed >= self.total
    }

    /// Returns `true` once the backend has reported a workload size.
    #[inline]
    pub fn is_measured(&self) -> bool {
        self.total > 0
    }

    /// Items still waiting to be processed.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.processed)
    }

    /// Rounded completion percentage, `0` while unmeasured, capped at 100.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.processed as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

impl std::fmt::Display for JobProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.processed, self.total)
    }
}

/// Body of the three search endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
}

/// Empty JSON object body (`{}`).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub(crate) struct EmptyBody {}

/// `created_at` accepts RFC 3339 or an offset-less ISO-8601 timestamp (read as UTC).
pub mod timestamp {
    use super::*;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    /// Parses a backend timestamp string.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }
        chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid created_at timestamp: {raw}"))
        })
    }
}
