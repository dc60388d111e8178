//! The belongs-to association proxy.
//!
//! The role-reversed side of has-one/has-many: it reads the live parent
//! reference held on the owner, and re-parenting through it performs the
//! symmetric update on the new parent's forward slot so the object graph
//! and the attribute tree are restored in a single operation.

use crate::{
    error::{DocBindError, DocBindResult},
    model::{Association, AssociationKind, Model},
    node::Node,
};

/// A view over one belongs-to association slot on an owner node.
pub struct BelongsTo {
    owner: Node,
    association: Association,
}

impl Node {
    /// Returns the belongs-to proxy for a declared association slot.
    pub fn belongs_to(&self, name: &str) -> DocBindResult<BelongsTo> {
        let association = self
            .model()
            .association(name)
            .cloned()
            .ok_or_else(|| {
                DocBindError::AssociationNotFound(self.model().name().to_string(), name.to_string())
            })?;
        if association.kind() != AssociationKind::BelongsTo {
            return Err(DocBindError::AssociationKind(
                self.model().name().to_string(),
                name.to_string(),
                AssociationKind::BelongsTo.label(),
            ));
        }

        Ok(BelongsTo {
            owner: self.clone(),
            association,
        })
    }
}

impl BelongsTo {
    /// The node that embeds the owner, or `None` for a root.
    pub fn get(&self) -> Option<Node> {
        self.owner.parent()
    }

    /// Re-parents the owner under `new_parent`.
    ///
    /// The inverse association on the parent model is resolved first: by
    /// the declared `inverse` name when one was given, otherwise by scanning
    /// the parent model for an embedded association targeting the owner's
    /// model (which is how a belongs-to site accepts parents of different
    /// models). The forward-side update then restores the graph/attribute
    /// invariant in one step: repeating the same assignment leaves exactly
    /// one serialized entry on the parent.
    pub fn set(&self, new_parent: &Node) -> DocBindResult<()> {
        let inverse = self.resolve_inverse(new_parent.model())?;

        match inverse.kind() {
            AssociationKind::HasOne => new_parent.has_one(inverse.name())?.set(Some(&self.owner)),
            AssociationKind::HasMany => new_parent
                .has_many(inverse.name())?
                .add_or_replace(&self.owner),
            AssociationKind::BelongsTo => Err(DocBindError::AssociationKind(
                new_parent.model().name().to_string(),
                inverse.name().to_string(),
                "embedded",
            )),
        }
    }

    fn resolve_inverse(&self, parent_model: &Model) -> DocBindResult<Association> {
        if let Some(name) = self.association.inverse_name() {
            return parent_model.association(name).cloned().ok_or_else(|| {
                DocBindError::AssociationNotFound(
                    parent_model.name().to_string(),
                    name.to_string(),
                )
            });
        }

        parent_model
            .associations()
            .iter()
            .find(|candidate| {
                matches!(
                    candidate.kind(),
                    AssociationKind::HasOne | AssociationKind::HasMany
                ) && candidate.target() == Some(self.owner.model().name())
            })
            .cloned()
            .ok_or_else(|| {
                DocBindError::AssociationNotFound(
                    parent_model.name().to_string(),
                    self.owner.model().name().to_string(),
                )
            })
    }
}
