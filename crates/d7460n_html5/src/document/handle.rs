use crate::document::Document;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt::Debug;
use std::sync::Arc;

/// Shared handle to the single structural snapshot. Readers take the read lock; the injection step
/// and user interaction take the write lock for the duration of one committed mutation.
#[derive(Clone, Default)]
pub struct DocumentHandle(Arc<RwLock<Document>>);

impl DocumentHandle {
    /// Create a new DocumentHandle from a document
    #[must_use]
    pub fn create(document: Document) -> Self {
        DocumentHandle(Arc::new(RwLock::new(document)))
    }

    /// Returns the document as referenced by the handle
    pub fn get(&self) -> RwLockReadGuard<'_, Document> {
        self.0.read()
    }

    /// Returns the document for mutation
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, Document> {
        self.0.write()
    }
}

impl Debug for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", *self.0.read())
    }
}
