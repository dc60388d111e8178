//! In-memory document storage backend for docbind.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` trait. It preserves insertion order per collection and
//! evaluates plain selector maps by field equality, making it ideal for
//! tests and small deployments.
//!
//! # Quick Start
//!
//! ```ignore
//! use docbind_core::{commands, database::Database, model::{Model, Schema}, node::Node};
//! use docbind_memory::MemoryStore;
//! use bson::doc;
//!
//! let schema = Schema::builder()
//!     .model(Model::builder("person").collection("people").key("title").build())
//!     .build()?;
//! let db = Database::new(schema.clone(), MemoryStore::new());
//!
//! let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" })?;
//! commands::save(&db, &person)?;
//!
//! assert!(db.find_by_id("person", "sir")?.is_some());
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbind_memory;

pub mod matcher;
pub mod store;

pub use store::{MemoryStore, MemoryStoreBuilder};
