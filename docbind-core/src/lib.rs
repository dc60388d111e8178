//! An object-document mapper binding in-memory object graphs to documents in a schemaless store.
//!
//! This crate is the core of the docbind project and provides:
//!
//! - **Document graph nodes** ([`node`]) - Mutable attribute trees with live parent/child links
//! - **Schema declaration** ([`model`]) - Models, association descriptors, and the schema registry
//! - **Association proxies** ([`has_one`], [`has_many`], [`belongs_to`]) - Views that keep the
//!   object graph and the attribute tree synchronized through every mutation
//! - **Persistence commands** ([`commands`]) - Save/create/destroy with root-cascading writes
//! - **Storage backend abstraction** ([`backend`]) - Trait for pluggable document stores
//! - **Collections and database context** ([`collection`], [`database`]) - Named store views and
//!   the explicit schema+backend context
//! - **Validation and callbacks** ([`validation`], [`callbacks`]) - Lifecycle invocation points
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docbind_core::{commands, database::Database, model::{Model, Schema}, node::Node};
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
//!     .build()?;
//!
//! let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" })?;
//! let address = Node::instantiate(&schema, "address", doc! { "street": "Oxford Street" })?;
//! person.has_many("addresses")?.push(&address)?;
//!
//! // Saving the embedded address writes the whole person document, once.
//! let db = Database::new(schema, backend);
//! commands::save(&db, &address)?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbind_core;

pub mod backend;
pub mod belongs_to;
pub mod callbacks;
pub mod collection;
pub mod commands;
pub mod database;
pub mod error;
pub mod has_many;
pub mod has_one;
pub mod model;
pub mod node;
pub mod slug;
pub mod validation;

#[cfg(test)]
mod test_support;
