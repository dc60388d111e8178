//! Named collection views over a storage backend.
//!
//! A [`Collection`] binds a collection name to a backend reference and
//! exposes the operations the persistence commands need: whole-document
//! save, selector-based remove and find. Only plain attribute maps cross
//! this boundary, never node handles.

use bson::Document;

use crate::{backend::StoreBackend, error::DocBindResult};

/// A named view over one collection in a storage backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend + ?Sized> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend + ?Sized> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes a full document, replacing any existing document with the
    /// same `_id`.
    pub fn save(&self, document: Document) -> DocBindResult<()> {
        self.backend.save_document(&self.name, document)
    }

    /// Removes every document matching the selector, returning how many
    /// were removed.
    pub fn remove(&self, selector: &Document) -> DocBindResult<u64> {
        self.backend.remove_documents(&self.name, selector)
    }

    /// Returns every document matching the selector, in storage order.
    pub fn find(&self, selector: &Document) -> DocBindResult<Vec<Document>> {
        self.backend.find_documents(&self.name, selector)
    }

    /// Returns the first document matching the selector, if any.
    pub fn find_one(&self, selector: &Document) -> DocBindResult<Option<Document>> {
        Ok(self.find(selector)?.into_iter().next())
    }

    /// Counts the documents matching the selector.
    pub fn count(&self, selector: &Document) -> DocBindResult<usize> {
        Ok(self.find(selector)?.len())
    }

    /// Drops the entire collection.
    pub fn drop(&self) -> DocBindResult<()> {
        self.backend.drop_collection(&self.name)
    }
}
