//! Quire Core Library
//!
//! This crate provides the content layer of Quire, a flat-file blog:
//! articles are stored one per file as a frontmatter block followed by a
//! Markdown/MDX body.
//!
//! # Architecture
//!
//! - **Files are the source of truth**: one `<slug>.mdx` file per article
//!   in a single flat directory. There is no index or database.
//! - **Tags are derived**: counts are recomputed by scanning the records.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Create a post
//! let meta = Metadata::dated_now("Hello World").with_tags(["rust"]);
//! store.create(&derive_slug(&meta.title), meta, "First post.")?;
//!
//! // Query posts
//! let posts = store.list()?;
//! ```
//!
//! # Modules
//!
//! - `store`: Record CRUD over the content directory (main entry point)
//! - `admin`: Authorized request surface over store, tags and uploads
//! - `models`: Data structures for records, summaries and tag counts
//! - `storage`: Frontmatter codec and file persistence
//! - `slug`: Slug derivation from titles
//! - `tags`: Derived tag index and corpus-wide tag rewrites
//! - `convert`: Rich-text HTML to Markdown conversion
//! - `assets`: Image uploads
//! - `auth`: Admin authorization
//! - `config`: Application configuration

pub mod admin;
pub mod assets;
pub mod auth;
pub mod config;
pub mod convert;
pub mod error;
pub mod models;
pub mod slug;
pub mod storage;
pub mod store;
pub mod tags;

#[cfg(test)]
mod test_support;

pub use admin::Admin;
pub use assets::{AssetStore, StoredAsset, MAX_UPLOAD_BYTES};
pub use auth::{AdminPolicy, Caller};
pub use config::Config;
pub use convert::to_storage_format;
pub use error::{ErrorCategory, StoreError, StoreResult};
pub use models::{Metadata, Record, RecordSummary, StoreStats, TagCount};
pub use slug::{derive_slug, is_valid_slug};
pub use storage::{CodecError, FsPersistence, RecordPersistence};
pub use store::Store;
pub use tags::{TagRewriteFailure, TagRewriteReport};
