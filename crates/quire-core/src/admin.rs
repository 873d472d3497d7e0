//! Request surface for the admin area
//!
//! `Admin` bundles the record store, the asset store and the admin policy.
//! Reads are open to anyone; every mutation checks the caller first and
//! fails with `Unauthorized` before touching disk.

use tracing::debug;

use crate::assets::{AssetStore, StoredAsset};
use crate::auth::{AdminPolicy, Caller};
use crate::config::Config;
use crate::error::StoreResult;
use crate::models::{Metadata, Record, RecordSummary, StoreStats, TagCount};
use crate::slug::derive_slug;
use crate::storage::{FsPersistence, RecordPersistence};
use crate::store::Store;
use crate::tags::{self, TagRewriteReport};

pub struct Admin<P: RecordPersistence = FsPersistence> {
    store: Store<P>,
    assets: AssetStore,
    policy: AdminPolicy,
}

impl Admin<FsPersistence> {
    /// Open the configured content and upload directories
    pub fn open(config: &Config) -> StoreResult<Self> {
        Ok(Self::new(
            Store::open_with_config(config)?,
            AssetStore::open_with_config(config),
            AdminPolicy::from_config(config),
        ))
    }
}

impl<P: RecordPersistence> Admin<P> {
    pub fn new(store: Store<P>, assets: AssetStore, policy: AdminPolicy) -> Self {
        Self {
            store,
            assets,
            policy,
        }
    }

    pub fn store(&self) -> &Store<P> {
        &self.store
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    /// Whether the caller may use the mutating operations
    pub fn check_admin(&self, caller: Option<&Caller>) -> bool {
        self.policy.is_admin(caller)
    }

    // ==================== Reads ====================

    pub fn list(&self) -> StoreResult<Vec<RecordSummary>> {
        self.store.list()
    }

    pub fn list_published(&self) -> StoreResult<Vec<RecordSummary>> {
        self.store.list_published()
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.store.exists(slug)
    }

    pub fn get(&self, slug: &str) -> StoreResult<Record> {
        self.store.read(slug)
    }

    pub fn list_tags(&self) -> StoreResult<Vec<TagCount>> {
        tags::list_tags(&self.store)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        self.store.stats()
    }

    // ==================== Mutations ====================

    /// Create a record; the slug is derived from the title when not given
    ///
    /// Returns the slug the record was stored under.
    pub fn create(
        &mut self,
        caller: Option<&Caller>,
        slug: Option<&str>,
        metadata: Metadata,
        body: &str,
    ) -> StoreResult<String> {
        self.policy.authorize(caller)?;
        let slug = match slug {
            Some(slug) => slug.to_string(),
            None => derive_slug(&metadata.title),
        };
        debug!(slug = %slug, "creating post");
        self.store.create(&slug, metadata, body)?;
        Ok(slug)
    }

    pub fn update(
        &mut self,
        caller: Option<&Caller>,
        slug: &str,
        metadata: Metadata,
        body: &str,
        new_slug: Option<&str>,
    ) -> StoreResult<String> {
        self.policy.authorize(caller)?;
        self.store.update(slug, metadata, body, new_slug)
    }

    pub fn delete(&mut self, caller: Option<&Caller>, slug: &str) -> StoreResult<()> {
        self.policy.authorize(caller)?;
        self.store.delete(slug)
    }

    pub fn toggle_draft(&mut self, caller: Option<&Caller>, slug: &str) -> StoreResult<bool> {
        self.policy.authorize(caller)?;
        self.store.toggle_draft(slug)
    }

    pub fn add_tag(&mut self, caller: Option<&Caller>, name: &str) -> StoreResult<String> {
        self.policy.authorize(caller)?;
        tags::add_tag(name)
    }

    pub fn rename_tag(
        &mut self,
        caller: Option<&Caller>,
        old_name: &str,
        new_name: &str,
    ) -> StoreResult<TagRewriteReport> {
        self.policy.authorize(caller)?;
        tags::rename_tag(&mut self.store, old_name, new_name)
    }

    pub fn delete_tag(
        &mut self,
        caller: Option<&Caller>,
        name: &str,
    ) -> StoreResult<TagRewriteReport> {
        self.policy.authorize(caller)?;
        tags::delete_tag(&mut self.store, name)
    }

    pub fn upload(
        &mut self,
        caller: Option<&Caller>,
        original_name: &str,
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> StoreResult<StoredAsset> {
        self.policy.authorize(caller)?;
        self.assets.store(original_name, bytes, declared_mime)
    }
}
