//! Storage layer
//!
//! Handles the on-disk representation of records.
//!
//! ## Architecture
//!
//! - **codec**: frontmatter + body text format of a single record file
//! - **persistence**: flat directory of `<slug>.mdx` files with atomic writes
//!
//! The document store owns the directory; nothing else writes to it.

pub mod codec;
pub mod persistence;

pub use codec::{decode, encode, CodecError};
pub use persistence::{FsPersistence, RecordPersistence, RECORD_EXTENSION};
