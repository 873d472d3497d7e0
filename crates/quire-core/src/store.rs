//! Document store
//!
//! The `Store` owns the content directory and is the only writer of record
//! files. It combines:
//! - the frontmatter codec (record <-> text)
//! - a `RecordPersistence` backend (text <-> file)
//!
//! ## Writers
//!
//! Every mutating method takes `&mut self`, so within one process writes are
//! serialized by the borrow checker. Two processes writing the same
//! directory are not coordinated.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! let meta = Metadata::dated_now("Hello World");
//! store.create("hello-world", meta, "Body")?;
//!
//! let posts = store.list()?;
//! ```

use std::cmp::Reverse;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{Metadata, Record, RecordSummary, StoreStats};
use crate::slug::is_valid_slug;
use crate::storage::{self, FsPersistence, RecordPersistence};

/// Directory-backed article store
pub struct Store<P: RecordPersistence = FsPersistence> {
    persistence: P,
}

impl Store<FsPersistence> {
    /// Open the store from the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(&config).context("Failed to open content directory")
    }

    /// Open the store with a specific configuration
    ///
    /// Creates the content directory if it does not exist yet.
    pub fn open_with_config(config: &Config) -> StoreResult<Self> {
        Self::open_dir(&config.content_dir)
    }

    /// Open the store on an explicit directory
    pub fn open_dir(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let persistence = FsPersistence::new(dir.as_ref());
        persistence.ensure_dir()?;
        Ok(Self { persistence })
    }

    /// Directory holding the record files
    pub fn content_dir(&self) -> &Path {
        self.persistence.dir()
    }
}

impl<P: RecordPersistence> Store<P> {
    /// Wrap an arbitrary persistence backend
    pub fn with_persistence(persistence: P) -> Self {
        Self { persistence }
    }

    /// Access the persistence backend
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    // ==================== Reads ====================

    /// Summaries of every readable record, newest first
    ///
    /// Files that fail to decode are skipped (and logged).
    pub fn list(&self) -> StoreResult<Vec<RecordSummary>> {
        Ok(self.list_records()?.iter().map(Record::summary).collect())
    }

    /// Summaries of non-draft records, newest first
    pub fn list_published(&self) -> StoreResult<Vec<RecordSummary>> {
        Ok(self
            .list_records()?
            .iter()
            .filter(|r| !r.metadata.draft)
            .map(Record::summary)
            .collect())
    }

    /// Summaries of records carrying `tag`, newest first
    pub fn list_by_tag(&self, tag: &str) -> StoreResult<Vec<RecordSummary>> {
        let tag = tag.trim();
        Ok(self
            .list_records()?
            .iter()
            .filter(|r| r.metadata.has_tag(tag))
            .map(Record::summary)
            .collect())
    }

    /// Every readable record, newest first
    pub fn list_records(&self) -> StoreResult<Vec<Record>> {
        let mut records = Vec::new();
        for slug in self.persistence.list_slugs()? {
            match self.load(&slug) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!(slug = %slug, "record vanished during listing"),
                Err(e) => warn!(slug = %slug, error = %e, "skipping unreadable post"),
            }
        }

        records.sort_by_cached_key(|r| (Reverse(r.metadata.timestamp()), r.slug.clone()));
        Ok(records)
    }

    /// Check whether a record exists
    pub fn exists(&self, slug: &str) -> bool {
        check_key(slug).is_ok() && self.persistence.exists(slug)
    }

    /// Read one record
    pub fn read(&self, slug: &str) -> StoreResult<Record> {
        check_key(slug)?;
        self.load(slug)?.ok_or_else(|| not_found(slug))
    }

    /// Record counts
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let summaries = self.list()?;
        let drafts = summaries.iter().filter(|s| s.draft).count();
        Ok(StoreStats {
            total: summaries.len(),
            published: summaries.len() - drafts,
            drafts,
        })
    }

    // ==================== Writes ====================

    /// Create a new record
    ///
    /// Fails with `AlreadyExists` if the slug is taken.
    pub fn create(&mut self, slug: &str, metadata: Metadata, body: &str) -> StoreResult<()> {
        check_new_slug(slug)?;
        metadata.validate()?;

        if self.persistence.exists(slug) {
            return Err(StoreError::AlreadyExists {
                slug: slug.to_string(),
            });
        }

        let text = encode(&metadata, body)?;
        self.persistence.write(slug, &text)?;
        info!(slug = %slug, "created post");
        Ok(())
    }

    /// Update a record, optionally renaming it
    ///
    /// When `new_slug` differs from `slug`, the record is written under the
    /// new slug first and the old file is removed only after that write
    /// succeeded. Returns the slug the record now lives under.
    pub fn update(
        &mut self,
        slug: &str,
        metadata: Metadata,
        body: &str,
        new_slug: Option<&str>,
    ) -> StoreResult<String> {
        check_key(slug)?;
        metadata.validate()?;

        let target = new_slug.filter(|n| *n != slug);
        let Some(target) = target else {
            if !self.persistence.exists(slug) {
                return Err(not_found(slug));
            }
            let text = encode(&metadata, body)?;
            self.persistence.write(slug, &text)?;
            info!(slug = %slug, "updated post");
            return Ok(slug.to_string());
        };

        check_new_slug(target)?;
        if !self.persistence.exists(slug) {
            return Err(not_found(slug));
        }
        if self.persistence.exists(target) {
            return Err(StoreError::Conflict {
                slug: target.to_string(),
            });
        }

        let text = encode(&metadata, body)?;
        self.persistence.write(target, &text)?;

        if let Err(e) = self.persistence.remove(slug) {
            warn!(
                from = %slug,
                to = %target,
                error = %e,
                "renamed post written but old file could not be removed"
            );
            return Err(e);
        }

        info!(from = %slug, to = %target, "renamed post");
        Ok(target.to_string())
    }

    /// Delete a record
    pub fn delete(&mut self, slug: &str) -> StoreResult<()> {
        check_key(slug)?;
        if !self.persistence.remove(slug)? {
            return Err(not_found(slug));
        }
        info!(slug = %slug, "deleted post");
        Ok(())
    }

    /// Flip the draft flag of a record; returns the new value
    pub fn toggle_draft(&mut self, slug: &str) -> StoreResult<bool> {
        let mut record = self.read(slug)?;
        record.metadata.draft = !record.metadata.draft;

        let text = encode(&record.metadata, &record.body)?;
        self.persistence.write(slug, &text)?;
        info!(slug = %slug, draft = record.metadata.draft, "toggled draft flag");
        Ok(record.metadata.draft)
    }

    /// Overwrite an existing record as-is (used by corpus-wide tag rewrites)
    ///
    /// Skips metadata validation so that records with unrelated problems
    /// can still have their tags rewritten.
    pub(crate) fn rewrite(&mut self, record: &Record) -> StoreResult<()> {
        check_key(&record.slug)?;
        if !self.persistence.exists(&record.slug) {
            return Err(not_found(&record.slug));
        }
        let text = encode(&record.metadata, &record.body)?;
        self.persistence.write(&record.slug, &text)
    }

    fn load(&self, slug: &str) -> StoreResult<Option<Record>> {
        let Some(text) = self.persistence.read(slug)? else {
            return Ok(None);
        };
        let (metadata, body) =
            storage::decode(&text).map_err(|source| StoreError::MalformedRecord {
                path: self.persistence.locate(slug),
                source,
            })?;
        Ok(Some(Record::new(slug, metadata, body)))
    }
}

fn encode(metadata: &Metadata, body: &str) -> StoreResult<String> {
    storage::encode(metadata, body)
        .map_err(|e| StoreError::validation(format!("metadata cannot be stored: {}", e)))
}

fn not_found(slug: &str) -> StoreError {
    StoreError::NotFound {
        slug: slug.to_string(),
    }
}

/// Reject keys that could escape the content directory
///
/// Existing files may predate the slug rules, so addressing only requires a
/// plain file name.
fn check_key(slug: &str) -> StoreResult<()> {
    let bad = slug.is_empty()
        || slug.starts_with('.')
        || slug.contains(['/', '\\', '\0'])
        || slug.trim() != slug;
    if bad {
        return Err(StoreError::validation(format!("invalid slug '{}'", slug)));
    }
    Ok(())
}

/// New identities must satisfy the slug rules
fn check_new_slug(slug: &str) -> StoreResult<()> {
    if !is_valid_slug(slug) {
        return Err(StoreError::validation(format!(
            "invalid slug '{}': use ASCII letters, digits, CJK characters and single hyphens",
            slug
        )));
    }
    Ok(())
}
