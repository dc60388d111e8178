//! The database context: schema plus storage backend.
//!
//! [`Database`] is the explicit connection object the persistence commands
//! and finders operate through; there is no process-wide store. It hands
//! out [`Collection`] views and materializes nodes from the documents the
//! backend returns.

use std::rc::Rc;

use bson::{Document, doc};

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::{DocBindError, DocBindResult},
    model::{Model, Schema},
    node::Node,
};

/// A schema bound to a storage backend.
#[derive(Debug)]
pub struct Database<B: StoreBackend> {
    schema: Rc<Schema>,
    backend: B,
}

impl<B: StoreBackend> Database<B> {
    /// Creates a new database context over the given backend.
    pub fn new(schema: Rc<Schema>, backend: B) -> Self {
        Self { schema, backend }
    }

    /// The schema registry this context was built with.
    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    /// Gets a collection view by name.
    pub fn collection(&self, name: &str) -> Collection<'_, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Gets the collection view backing a model.
    pub fn collection_for(&self, model: &Model) -> Collection<'_, B> {
        self.collection(model.collection())
    }

    /// Finds every document of a model matching the selector, materialized
    /// as root nodes.
    pub fn find_all(&self, model_name: &str, selector: &Document) -> DocBindResult<Vec<Node>> {
        let model = self.schema.model(model_name)?;
        self.collection_for(&model)
            .find(selector)?
            .into_iter()
            .map(|document| Node::instantiate(&self.schema, model_name, document))
            .collect()
    }

    /// Finds the first matching document of a model, if any.
    pub fn find_first(
        &self,
        model_name: &str,
        selector: &Document,
    ) -> DocBindResult<Option<Node>> {
        let model = self.schema.model(model_name)?;
        self.collection_for(&model)
            .find_one(selector)?
            .map(|document| Node::instantiate(&self.schema, model_name, document))
            .transpose()
    }

    /// Finds a document of a model by its identity key.
    pub fn find_by_id(&self, model_name: &str, id: &str) -> DocBindResult<Option<Node>> {
        self.find_first(model_name, &doc! { "_id": id })
    }

    /// Counts the documents of a model matching the selector.
    pub fn count(&self, model_name: &str, selector: &Document) -> DocBindResult<usize> {
        let model = self.schema.model(model_name)?;
        self.collection_for(&model).count(selector)
    }

    /// Refetches a node's document from the store and replaces its attribute
    /// tree in place, rebuilding embedded children. Identity is kept.
    pub fn reload(&self, node: &Node) -> DocBindResult<()> {
        let fetched = self
            .collection_for(node.model())
            .find_one(&doc! { "_id": node.identity() })?
            .ok_or_else(|| {
                DocBindError::DocumentNotFound(
                    node.identity().to_string(),
                    node.model().collection().to_string(),
                )
            })?;

        node.replace_attributes(fetched)
    }

    /// Shuts down the backend, releasing its resources.
    pub fn shutdown(self) -> DocBindResult<()> {
        self.backend.shutdown()
    }
}
