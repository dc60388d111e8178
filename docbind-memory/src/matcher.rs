//! Selector evaluation for in-memory document filtering.
//!
//! Selectors are plain documents; a stored document matches when every
//! selector field compares equal to the corresponding document field.
//! Values are normalized before comparison so that, for example, an `Int32`
//! selector matches an `Int64` field with the same value.

use std::collections::HashMap;

use bson::{Bson, DateTime, Document};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so mixed-width comparisons behave.
#[derive(Debug, PartialEq)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(array) => Comparable::Array(array.iter().map(Comparable::from).collect()),
            Bson::Document(document) => Comparable::Map(
                document
                    .iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
            // Other types are not comparable
            _ => Comparable::Null,
        }
    }
}

/// Whether a stored document satisfies a selector.
///
/// An empty selector matches everything. A selector field missing from the
/// document matches only when the expected value is `Null`.
pub(crate) fn matches(document: &Document, selector: &Document) -> bool {
    selector.iter().all(|(field, expected)| {
        match document.get(field) {
            Some(actual) => Comparable::from(actual) == Comparable::from(expected),
            None => matches!(*expected, Bson::Null),
        }
    })
}
