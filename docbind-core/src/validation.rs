//! Validation invocation for document graph nodes.
//!
//! The rule DSL itself lives with the application: any type implementing
//! [`Validation`] can be registered on a model. The engine only owns the
//! invocation contract: run every registered rule once at the start of a
//! save, collect messages into node-local error state, and report pass/fail.

use bson::Bson;

use crate::node::Node;

/// A single validation rule attached to a model.
///
/// Implementations must be idempotent and side-effect-free beyond the error
/// message they report; the engine handles collecting messages onto the node.
pub trait Validation {
    /// Checks the node, returning a message describing the failure if any.
    fn validate(&self, node: &Node) -> Result<(), String>;
}

/// Validates that a field is present and non-empty.
pub struct PresenceOf {
    field: String,
}

impl PresenceOf {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl Validation for PresenceOf {
    fn validate(&self, node: &Node) -> Result<(), String> {
        let present = match node.get(&self.field) {
            None | Some(Bson::Null) => false,
            Some(Bson::String(value)) => !value.is_empty(),
            Some(_) => true,
        };

        if present {
            Ok(())
        } else {
            Err(format!("{} must be present", self.field))
        }
    }
}

/// Runs every validation registered on the node's model.
///
/// Clears the node's error state first, then collects one message per failing
/// rule. Returns `true` when the node passed all rules.
pub fn execute(node: &Node) -> bool {
    node.clear_errors();

    let model = node.model().clone();
    for rule in model.validations() {
        if let Err(message) = rule.validate(node) {
            node.add_error(message);
        }
    }

    node.errors().is_empty()
}
