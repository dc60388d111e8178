//! Storage backend abstraction.
//!
//! The mapping engine never talks to a store directly: it hands plain
//! attribute maps to a [`StoreBackend`] and gets plain attribute maps back.
//! Implementations provide the concrete storage strategy; `docbind-memory`
//! ships an in-memory one; anything able to upsert, remove, and find whole
//! documents by selector can back the engine.
//!
//! All operations are synchronous and blocking: the engine performs one
//! logical operation at a time, and a save's single store write is treated
//! as atomic only insofar as the backend makes whole-document overwrites
//! atomic. Retry policy, if any, belongs to the backend.

use std::fmt::Debug;

use bson::Document;

use crate::error::DocBindResult;

/// Abstract interface for document storage backends.
///
/// Selectors are plain documents matched by field equality; translation to
/// anything store-native is the implementation's concern.
pub trait StoreBackend: Debug {
    /// Writes a full document into a collection, replacing any existing
    /// document with the same `_id`. The collection is created if missing.
    ///
    /// This is whole-document overwrite semantics, never a partial-field
    /// update.
    fn save_document(&self, collection: &str, document: Document) -> DocBindResult<()>;

    /// Removes every document matching the selector, returning how many
    /// were removed.
    fn remove_documents(&self, collection: &str, selector: &Document) -> DocBindResult<u64>;

    /// Returns every document matching the selector, in storage order.
    /// An unknown collection yields an empty result, not an error.
    fn find_documents(&self, collection: &str, selector: &Document) -> DocBindResult<Vec<Document>>;

    /// Creates an empty collection; a no-op when it already exists.
    fn create_collection(&self, name: &str) -> DocBindResult<()>;

    /// Drops a collection and all its documents.
    fn drop_collection(&self, name: &str) -> DocBindResult<()>;

    /// Lists the names of all collections in the store.
    fn list_collections(&self) -> DocBindResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op; backends with persistent
    /// storage or external connections should override this.
    fn shutdown(self) -> DocBindResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

impl<B> StoreBackend for &B
where
    B: StoreBackend + ?Sized,
{
    fn save_document(&self, collection: &str, document: Document) -> DocBindResult<()> {
        (*self).save_document(collection, document)
    }

    fn remove_documents(&self, collection: &str, selector: &Document) -> DocBindResult<u64> {
        (*self).remove_documents(collection, selector)
    }

    fn find_documents(&self, collection: &str, selector: &Document) -> DocBindResult<Vec<Document>> {
        (*self).find_documents(collection, selector)
    }

    fn create_collection(&self, name: &str) -> DocBindResult<()> {
        (*self).create_collection(name)
    }

    fn drop_collection(&self, name: &str) -> DocBindResult<()> {
        (*self).drop_collection(name)
    }

    fn list_collections(&self) -> DocBindResult<Vec<String>> {
        (*self).list_collections()
    }
}

impl<B> StoreBackend for Box<B>
where
    B: StoreBackend + ?Sized,
{
    fn save_document(&self, collection: &str, document: Document) -> DocBindResult<()> {
        (**self).save_document(collection, document)
    }

    fn remove_documents(&self, collection: &str, selector: &Document) -> DocBindResult<u64> {
        (**self).remove_documents(collection, selector)
    }

    fn find_documents(&self, collection: &str, selector: &Document) -> DocBindResult<Vec<Document>> {
        (**self).find_documents(collection, selector)
    }

    fn create_collection(&self, name: &str) -> DocBindResult<()> {
        (**self).create_collection(name)
    }

    fn drop_collection(&self, name: &str) -> DocBindResult<()> {
        (**self).drop_collection(name)
    }

    fn list_collections(&self) -> DocBindResult<Vec<String>> {
        (**self).list_collections()
    }
}

impl<B> StoreBackend for std::rc::Rc<B>
where
    B: StoreBackend + ?Sized,
{
    fn save_document(&self, collection: &str, document: Document) -> DocBindResult<()> {
        (**self).save_document(collection, document)
    }

    fn remove_documents(&self, collection: &str, selector: &Document) -> DocBindResult<u64> {
        (**self).remove_documents(collection, selector)
    }

    fn find_documents(&self, collection: &str, selector: &Document) -> DocBindResult<Vec<Document>> {
        (**self).find_documents(collection, selector)
    }

    fn create_collection(&self, name: &str) -> DocBindResult<()> {
        (**self).create_collection(name)
    }

    fn drop_collection(&self, name: &str) -> DocBindResult<()> {
        (**self).drop_collection(name)
    }

    fn list_collections(&self) -> DocBindResult<Vec<String>> {
        (**self).list_collections()
    }
}

/// Factory trait for creating backend instances.
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    fn build(self) -> DocBindResult<Self::Backend>;
}
