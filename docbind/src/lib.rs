//! Main docbind crate providing a unified interface for object-document mapping.
//!
//! This crate is the primary entry point for users of the docbind framework.
//! It re-exports the core types and functionality from the sub-crates and
//! provides convenient access to the shipped storage backend.
//!
//! # Features
//!
//! - **Document graphs** - Parents embed one-to-one and one-to-many children;
//!   children link back to their parents without owning them
//! - **Synchronized representations** - Every mutation through a node or an
//!   association proxy keeps the object graph and the attribute tree in lockstep
//! - **Cascading persistence** - Saves anywhere in a graph delegate to the root,
//!   which issues exactly one whole-document write
//! - **Lifecycle hooks** - Validations and ordered callbacks around save, create,
//!   and destroy
//!
//! # Quick Start
//!
//! ```ignore
//! use docbind::{prelude::*, memory::MemoryStore};
//! use bson::doc;
//!
//! let schema = Schema::builder()
//!     .model(
//!         Model::builder("person")
//!             .collection("people")
//!             .key("title")
//!             .has_many("addresses", "address")
//!             .build(),
//!     )
//!     .model(
//!         Model::builder("address")
//!             .key("street")
//!             .belongs_to("addressable")
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let db = Database::new(schema.clone(), MemoryStore::new());
//!
//! let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();
//! let address = Node::instantiate(&schema, "address", doc! { "street": "Oxford Street" }).unwrap();
//! person.has_many("addresses").unwrap().push(&address).unwrap();
//!
//! // Saving the embedded address writes the whole person document, once.
//! commands::save(&db, &address).unwrap();
//! let found = db.find_by_id("person", "sir").unwrap().unwrap();
//! assert_eq!(found, person);
//! ```

pub mod prelude;

pub use docbind_core::{
    backend, belongs_to, callbacks, collection, commands, database, error, has_many, has_one,
    model, node, slug, validation,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docbind_memory::{MemoryStore, MemoryStoreBuilder};
}
