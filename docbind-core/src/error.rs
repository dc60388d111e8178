//! Error types and result types for mapping operations.
//!
//! Use [`DocBindResult<T>`] as the return type for fallible operations.
//! Validation failure is deliberately absent from this enum: it is an
//! expected outcome signaled through [`SaveOutcome`](crate::commands::SaveOutcome),
//! not an error.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur while mapping documents
/// or talking to a storage backend.
#[derive(Error, Debug)]
pub enum DocBindError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The named model is not registered in the schema.
    #[error("Model not registered: {0}")]
    ModelNotFound(String),
    /// The named association is not declared on the model.
    /// The first argument is the model name, the second the association name.
    #[error("Association {1} is not defined on model {0}")]
    AssociationNotFound(String, String),
    /// The association exists but was declared with a different kind.
    /// Arguments are model name, association name, and the requested kind.
    #[error("Association {1} on model {0} is not a {2} association")]
    AssociationKind(String, String, &'static str),
    /// Re-parenting would make a document an ancestor of itself.
    #[error("Document {0} cannot be embedded under one of its own descendants")]
    CircularGraph(String),
    /// A lifecycle callback triggered a save on the document already being saved.
    #[error("Save re-entered from a callback on document {0}")]
    ReentrantSave(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The document has invalid structure (e.g. a write without an `_id`).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for mapping operations.
pub type DocBindResult<T> = Result<T, DocBindError>;

impl From<BsonError> for DocBindError {
    fn from(err: BsonError) -> Self {
        DocBindError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocBindError {
    fn from(err: SerdeJsonError) -> Self {
        DocBindError::Serialization(err.to_string())
    }
}
