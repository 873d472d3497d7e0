//! Shared helpers for unit tests

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};
use crate::storage::{FsPersistence, RecordPersistence};

/// Filesystem persistence that refuses writes to selected slugs
pub(crate) struct FlakyPersistence {
    inner: FsPersistence,
    failing: RefCell<HashSet<String>>,
}

impl FlakyPersistence {
    pub(crate) fn new(inner: FsPersistence) -> Self {
        Self {
            inner,
            failing: RefCell::new(HashSet::new()),
        }
    }

    pub(crate) fn fail_writes_to(&self, slug: &str) {
        self.failing.borrow_mut().insert(slug.to_string());
    }
}

impl RecordPersistence for FlakyPersistence {
    fn list_slugs(&self) -> StoreResult<Vec<String>> {
        self.inner.list_slugs()
    }

    fn exists(&self, slug: &str) -> bool {
        self.inner.exists(slug)
    }

    fn read(&self, slug: &str) -> StoreResult<Option<String>> {
        self.inner.read(slug)
    }

    fn write(&self, slug: &str, content: &str) -> StoreResult<()> {
        if self.failing.borrow().contains(slug) {
            return Err(StoreError::from_io(
                io::Error::new(io::ErrorKind::Other, "No space left on device"),
                self.inner.locate(slug),
            ));
        }
        self.inner.write(slug, content)
    }

    fn remove(&self, slug: &str) -> StoreResult<bool> {
        self.inner.remove(slug)
    }

    fn locate(&self, slug: &str) -> PathBuf {
        self.inner.locate(slug)
    }
}
