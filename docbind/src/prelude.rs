//! Convenient re-exports of commonly used types from docbind.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docbind::prelude::*;
//! ```

pub use docbind_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    belongs_to::BelongsTo,
    callbacks::Phase,
    collection::Collection,
    commands::{self, DestroyAllReport, SaveOutcome},
    database::Database,
    error::{DocBindError, DocBindResult},
    has_many::HasMany,
    has_one::HasOne,
    model::{Association, AssociationKind, Model, ModelBuilder, Schema, SchemaBuilder},
    node::Node,
    validation::{PresenceOf, Validation},
};
