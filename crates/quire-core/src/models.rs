//! Data models for Quire
//!
//! Defines the article record, its frontmatter metadata, and the derived
//! summary and tag views handed back to callers.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Frontmatter of an article
///
/// Known keys are typed; anything else found in a file is kept in `extra`
/// so a rewrite never drops hand-edited keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    /// Display title
    pub title: String,
    /// Publication timestamp, kept verbatim (RFC 3339 or `YYYY-MM-DD`)
    pub date: String,
    /// Tags in author order
    #[serde(default)]
    pub tags: Vec<String>,
    /// Drafts are hidden from the public listing
    #[serde(default)]
    pub draft: bool,
    /// Optional teaser shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Rendering template name, opaque to the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Any other frontmatter keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Metadata {
    /// Create metadata with a title and an explicit date string
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            tags: Vec::new(),
            draft: false,
            summary: None,
            layout: None,
            extra: BTreeMap::new(),
        }
    }

    /// Create metadata dated now (RFC 3339, millisecond precision, UTC)
    pub fn dated_now(title: impl Into<String>) -> Self {
        let date = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        Self::new(title, date)
    }

    /// Builder-style tag setter
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style draft setter
    pub fn with_draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    /// Check whether the tag list contains `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Parse `date` into a timestamp
    ///
    /// Accepts RFC 3339 and plain `YYYY-MM-DD` (taken as midnight UTC).
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(&self.date)
    }

    /// Check the shape required before a record is written
    pub fn validate(&self) -> StoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation("title is required"));
        }
        if self.date.trim().is_empty() {
            return Err(StoreError::validation("date is required"));
        }
        if self.timestamp().is_none() {
            return Err(StoreError::validation(format!(
                "date '{}' is not an ISO-8601 timestamp",
                self.date
            )));
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(StoreError::validation("tags must not be blank"));
        }
        Ok(())
    }
}

/// Parse a frontmatter date string
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// One article: identity, frontmatter and body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub slug: String,
    pub metadata: Metadata,
    pub body: String,
}

impl Record {
    pub fn new(slug: impl Into<String>, metadata: Metadata, body: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            metadata,
            body: body.into(),
        }
    }

    /// Listing view of this record
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            slug: self.slug.clone(),
            title: self.metadata.title.clone(),
            date: self.metadata.date.clone(),
            draft: self.metadata.draft,
        }
    }
}

/// Listing entry for a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSummary {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub draft: bool,
}

impl RecordSummary {
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(&self.date)
    }
}

/// A tag and the number of records carrying it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

impl TagCount {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Record counts for the status view
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_new_defaults() {
        let meta = Metadata::new("Hello", "2024-05-01T10:00:00Z");
        assert!(meta.tags.is_empty());
        assert!(!meta.draft);
        assert!(meta.summary.is_none());
        assert!(meta.layout.is_none());
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2024-05-01T10:00:00.000Z").is_some());
        assert!(parse_date("2024-05-01T10:00:00+08:00").is_some());
        assert!(parse_date("2024-05-01").is_some());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_plain_date_is_midnight_utc() {
        let ts = parse_date("2024-05-01").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T00:00:00+00:00");
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let meta = Metadata::new("   ", "2024-05-01");
        assert!(matches!(meta.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let meta = Metadata::new("Title", "not a date");
        let err = meta.validate().unwrap_err();
        assert!(err.to_string().contains("not a date"));
    }

    #[test]
    fn test_validate_rejects_blank_tag() {
        let meta = Metadata::new("Title", "2024-05-01").with_tags(["rust", " "]);
        assert!(meta.validate().is_err());
    }

    #[test]
    fn test_dated_now_is_valid() {
        let meta = Metadata::dated_now("Fresh");
        assert!(meta.validate().is_ok());
        assert!(meta.date.ends_with('Z'));
    }

    #[test]
    fn test_record_summary() {
        let meta = Metadata::new("Title", "2024-05-01").with_draft(true);
        let record = Record::new("title", meta, "body");
        let summary = record.summary();
        assert_eq!(summary.slug, "title");
        assert_eq!(summary.title, "Title");
        assert!(summary.draft);
    }

    #[test]
    fn test_has_tag_is_exact() {
        let meta = Metadata::new("Title", "2024-05-01").with_tags(["Rust"]);
        assert!(meta.has_tag("Rust"));
        assert!(!meta.has_tag("rust"));
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RecordSummary {
            slug: "a".to_string(),
            title: "A".to_string(),
            date: "2024-05-01".to_string(),
            draft: false,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["slug"], "a");
        assert_eq!(json["draft"], false);
    }
}
