//! Lifecycle callback phases and invocation.
//!
//! Callbacks are plain closures registered per model and per phase at schema
//! declaration time, and invoked synchronously in registration order by the
//! persistence commands. A callback must not trigger a save on the document
//! it was invoked for; the commands reject that with
//! [`DocBindError::ReentrantSave`](crate::error::DocBindError::ReentrantSave).

use std::rc::Rc;

use crate::{model::Model, node::Node};

/// Lifecycle phases surrounding the persistence commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    BeforeSave,
    AfterSave,
    BeforeCreate,
    AfterCreate,
    BeforeDestroy,
    AfterDestroy,
}

/// A registered lifecycle handler.
pub type Callback = Rc<dyn Fn(&Node)>;

/// Runs every handler registered for `phase` on the node's model, in
/// registration order.
pub(crate) fn run(model: &Model, node: &Node, phase: Phase) {
    for handler in model.callbacks(phase) {
        handler(node);
    }
}
