//! Tag index
//!
//! Tags are not stored on their own: they exist only as entries of a
//! record's `tags` list. Every view is recomputed by scanning the store, and
//! rename/delete rewrite each affected record file.
//!
//! Rename and delete first build a complete plan (every affected record and
//! its new tag list) and only then write. Writes are per file: if one fails
//! the others still go through and nothing is rolled back. The returned
//! `TagRewriteReport` says exactly which records changed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::{Record, TagCount};
use crate::storage::RecordPersistence;
use crate::store::Store;

/// Records to rewrite for one tag operation, computed before any write
#[derive(Debug, Clone, PartialEq)]
pub struct TagRewritePlan {
    /// Number of records examined
    pub scanned: usize,
    /// Records with their new tag lists applied
    pub changes: Vec<Record>,
}

/// A record that could not be rewritten
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagRewriteFailure {
    pub slug: String,
    pub error: String,
}

/// Outcome of a corpus-wide tag rewrite
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TagRewriteReport {
    /// Records examined
    pub scanned: usize,
    /// Records carrying the tag
    pub matched: usize,
    /// Records successfully rewritten
    pub rewritten: Vec<String>,
    /// Records whose rewrite failed
    pub failures: Vec<TagRewriteFailure>,
}

impl TagRewriteReport {
    /// True when every matched record was rewritten
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Tag usage counts, sorted by name
///
/// A record listing the same tag twice counts once.
pub fn list_tags<P: RecordPersistence>(store: &Store<P>) -> StoreResult<Vec<TagCount>> {
    Ok(count_tags(&store.list_records()?))
}

/// Count tags over a set of records
pub fn count_tags(records: &[Record]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let distinct: BTreeSet<&str> = record
            .metadata
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        for tag in distinct {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|(name, count)| TagCount::new(name, count))
        .collect()
}

/// Validate a tag name for creation
///
/// Tags only materialize when attached to a record, so nothing is written;
/// the trimmed name is returned for the caller to attach.
pub fn add_tag(name: &str) -> StoreResult<String> {
    validate_name(name)
}

/// Rename a tag across every record
pub fn rename_tag<P: RecordPersistence>(
    store: &mut Store<P>,
    old_name: &str,
    new_name: &str,
) -> StoreResult<TagRewriteReport> {
    let old_name = validate_name(old_name)?;
    let new_name = validate_name(new_name)?;

    let records = store.list_records()?;
    let plan = plan_rename(&records, &old_name, &new_name);
    let report = apply(store, plan);

    info!(
        from = %old_name,
        to = %new_name,
        rewritten = report.rewritten.len(),
        failed = report.failures.len(),
        "renamed tag"
    );
    Ok(report)
}

/// Remove a tag from every record
pub fn delete_tag<P: RecordPersistence>(
    store: &mut Store<P>,
    name: &str,
) -> StoreResult<TagRewriteReport> {
    let name = validate_name(name)?;

    let records = store.list_records()?;
    let plan = plan_delete(&records, &name);
    let report = apply(store, plan);

    info!(
        tag = %name,
        rewritten = report.rewritten.len(),
        failed = report.failures.len(),
        "deleted tag"
    );
    Ok(report)
}

/// Compute the records affected by renaming `old_name` to `new_name`
pub fn plan_rename(records: &[Record], old_name: &str, new_name: &str) -> TagRewritePlan {
    let changes = if old_name == new_name {
        Vec::new()
    } else {
        records
            .iter()
            .filter_map(|record| {
                renamed_tags(&record.metadata.tags, old_name, new_name).map(|tags| {
                    let mut record = record.clone();
                    record.metadata.tags = tags;
                    record
                })
            })
            .collect()
    };

    TagRewritePlan {
        scanned: records.len(),
        changes,
    }
}

/// Compute the records affected by deleting `name`
pub fn plan_delete(records: &[Record], name: &str) -> TagRewritePlan {
    let changes = records
        .iter()
        .filter_map(|record| {
            without_tag(&record.metadata.tags, name).map(|tags| {
                let mut record = record.clone();
                record.metadata.tags = tags;
                record
            })
        })
        .collect();

    TagRewritePlan {
        scanned: records.len(),
        changes,
    }
}

fn apply<P: RecordPersistence>(store: &mut Store<P>, plan: TagRewritePlan) -> TagRewriteReport {
    let mut report = TagRewriteReport {
        scanned: plan.scanned,
        matched: plan.changes.len(),
        ..TagRewriteReport::default()
    };

    for record in &plan.changes {
        match store.rewrite(record) {
            Ok(()) => report.rewritten.push(record.slug.clone()),
            Err(e) => {
                warn!(slug = %record.slug, error = %e, "tag rewrite failed");
                report.failures.push(TagRewriteFailure {
                    slug: record.slug.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if !report.is_complete() {
        warn!(
            rewritten = report.rewritten.len(),
            failed = report.failures.len(),
            "tag rewrite only partially applied"
        );
    }
    report
}

/// Replace `old` with `new`, keeping only the first `new`; `None` if `old` is absent
fn renamed_tags(tags: &[String], old: &str, new: &str) -> Option<Vec<String>> {
    if !tags.iter().any(|t| t.trim() == old) {
        return None;
    }

    let mut seen_new = false;
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = if tag.trim() == old { new } else { tag.as_str() };
        if tag.trim() == new {
            if seen_new {
                continue;
            }
            seen_new = true;
            out.push(new.to_string());
        } else {
            out.push(tag.to_string());
        }
    }
    Some(out)
}

/// Drop every occurrence of `name`; `None` if it is absent
fn without_tag(tags: &[String], name: &str) -> Option<Vec<String>> {
    if !tags.iter().any(|t| t.trim() == name) {
        return None;
    }
    Some(
        tags.iter()
            .filter(|t| t.trim() != name)
            .cloned()
            .collect(),
    )
}

fn validate_name(name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::validation("tag name must not be empty"));
    }
    Ok(name.to_string())
}
