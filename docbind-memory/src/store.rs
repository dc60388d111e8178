//! In-memory storage implementation for the mapping engine.
//!
//! Documents are stored as BSON attribute maps in per-collection vectors
//! behind a read-write lock. Insertion order is preserved, so `find` (and
//! therefore `find_first`) is deterministic without index support.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use bson::{Bson, Document};
use log::trace;

use docbind_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocBindError, DocBindResult},
};

use crate::matcher;

/// One collection: `(_id, document)` pairs in insertion order.
type Entries = Vec<(String, Document)>;
type StoreMap = HashMap<String, Entries>;

/// Thread-safe in-memory document storage backend.
///
/// `MemoryStore` is cloneable and uses an `Arc`-wrapped internal state:
/// clones share the same underlying data. Queries scan every document in a
/// collection, which is fine for the test and small-deployment use cases
/// this backend targets.
///
/// # Example
///
/// ```ignore
/// use docbind_memory::MemoryStore;
/// use docbind_core::backend::StoreBackend;
/// use bson::doc;
///
/// let store = MemoryStore::new();
/// store.save_document("people", doc! { "_id": "sir", "title": "Sir" })?;
/// let found = store.find_documents("people", &doc! { "title": "Sir" })?;
/// assert_eq!(found.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing a `MemoryStore`.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder
    }

    fn read(&self) -> DocBindResult<std::sync::RwLockReadGuard<'_, StoreMap>> {
        self.store
            .read()
            .map_err(|error| DocBindError::Backend(error.to_string()))
    }

    fn write(&self) -> DocBindResult<std::sync::RwLockWriteGuard<'_, StoreMap>> {
        self.store
            .write()
            .map_err(|error| DocBindError::Backend(error.to_string()))
    }
}

impl StoreBackend for MemoryStore {
    fn save_document(&self, collection: &str, document: Document) -> DocBindResult<()> {
        let id = match document.get("_id") {
            Some(Bson::String(id)) if !id.is_empty() => id.clone(),
            _ => {
                return Err(DocBindError::InvalidDocument(
                    "cannot save a document without a string _id".to_string(),
                ));
            }
        };

        let mut store = self.write()?;
        let entries = store.entry(collection.to_string()).or_default();

        match entries.iter_mut().find(|(entry_id, _)| *entry_id == id) {
            Some(slot) => {
                trace!("replacing document {id} in collection {collection}");
                slot.1 = document;
            }
            None => {
                trace!("inserting document {id} into collection {collection}");
                entries.push((id, document));
            }
        }

        Ok(())
    }

    fn remove_documents(&self, collection: &str, selector: &Document) -> DocBindResult<u64> {
        let mut store = self.write()?;
        let entries = store
            .get_mut(collection)
            .ok_or_else(|| DocBindError::CollectionNotFound(collection.to_string()))?;

        let before = entries.len();
        entries.retain(|(_, document)| !matcher::matches(document, selector));
        let removed = (before - entries.len()) as u64;
        trace!("removed {removed} documents from collection {collection}");

        Ok(removed)
    }

    fn find_documents(&self, collection: &str, selector: &Document) -> DocBindResult<Vec<Document>> {
        let store = self.read()?;
        let Some(entries) = store.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter(|(_, document)| matcher::matches(document, selector))
            .map(|(_, document)| document.clone())
            .collect())
    }

    fn create_collection(&self, name: &str) -> DocBindResult<()> {
        self.write()?.entry(name.to_string()).or_default();
        Ok(())
    }

    fn drop_collection(&self, name: &str) -> DocBindResult<()> {
        if self.write()?.remove(name).is_none() {
            return Err(DocBindError::CollectionNotFound(name.to_string()));
        }
        Ok(())
    }

    fn list_collections(&self) -> DocBindResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }
}

/// Builder for [`MemoryStore`] instances.
///
/// Currently a no-op builder; it exists so the memory backend participates
/// in the same construction pattern as backends that need configuration.
#[derive(Default)]
pub struct MemoryStoreBuilder;

impl StoreBackendBuilder for MemoryStoreBuilder {
    type Backend = MemoryStore;

    fn build(self) -> DocBindResult<Self::Backend> {
        Ok(MemoryStore::new())
    }
}
