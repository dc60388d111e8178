//! The has-many association proxy.
//!
//! Wraps an ordered sequence of embedded children, keeping the live node
//! sequence and the owner's attribute array positionally aligned through
//! every mutation. Read misses (empty slots, out-of-range indexes, unknown
//! identities) return empty results, never errors.

use bson::{Bson, Document};

use crate::{
    error::{DocBindError, DocBindResult},
    model::{Association, AssociationKind},
    node::Node,
};

/// A view over one has-many association slot on an owner node.
pub struct HasMany {
    owner: Node,
    association: Association,
}

impl Node {
    /// Returns the has-many proxy for a declared association slot.
    pub fn has_many(&self, name: &str) -> DocBindResult<HasMany> {
        let association = self
            .model()
            .association(name)
            .cloned()
            .ok_or_else(|| {
                DocBindError::AssociationNotFound(self.model().name().to_string(), name.to_string())
            })?;
        if association.kind() != AssociationKind::HasMany {
            return Err(DocBindError::AssociationKind(
                self.model().name().to_string(),
                name.to_string(),
                AssociationKind::HasMany.label(),
            ));
        }

        Ok(HasMany {
            owner: self.clone(),
            association,
        })
    }
}

impl HasMany {
    /// Re-parents the target under the owner and appends it. Appending the
    /// same instance twice grows the sequence twice; no deduplication.
    pub fn push(&self, target: &Node) -> DocBindResult<()> {
        self.owner.materialize_many(&self.association)?;
        self.owner.ensure_can_adopt(target)?;

        target.set_parent(&self.owner, self.association.name());
        self.owner.push_many(self.association.name(), target.clone());
        self.owner
            .append_embedded_entry(self.association.name(), target);
        self.owner.sync_into_parent();

        Ok(())
    }

    /// Appends every target in order, exactly as [`HasMany::push`] would.
    pub fn concat(&self, targets: &[Node]) -> DocBindResult<()> {
        for target in targets {
            self.push(target)?;
        }
        Ok(())
    }

    /// Constructs a new child from raw attributes, appends it exactly as
    /// `push` would, and returns it.
    pub fn build(&self, attributes: Document) -> DocBindResult<Node> {
        let child = Node::instantiate(
            self.owner.schema(),
            self.association.embedded_target(),
            attributes,
        )?;
        self.push(&child)?;
        Ok(child)
    }

    /// Wholesale replacement of the sequence. The slot is cleared, then each
    /// target is added by identity, so later duplicates replace earlier ones,
    /// unlike `push`.
    pub fn assign(&self, targets: &[Node]) -> DocBindResult<()> {
        self.clear();
        for target in targets {
            self.add_or_replace(target)?;
        }
        Ok(())
    }

    /// Identity-keyed upsert: re-parents the target, then replaces the entry
    /// with the same identity or appends when none exists. Repeating the
    /// same assignment leaves exactly one entry.
    pub fn add_or_replace(&self, target: &Node) -> DocBindResult<()> {
        self.owner.materialize_many(&self.association)?;
        self.owner.ensure_can_adopt(target)?;

        target.set_parent(&self.owner, self.association.name());
        self.owner.upsert_many(self.association.name(), target.clone());
        self.owner
            .upsert_embedded_entry(self.association.name(), target);
        self.owner.sync_into_parent();

        Ok(())
    }

    /// All live members in order.
    pub fn find_all(&self) -> DocBindResult<Vec<Node>> {
        self.owner.materialize_many(&self.association)
    }

    /// Linear scan for a member by identity; `None` for unknown identities.
    pub fn find(&self, identity: &str) -> DocBindResult<Option<Node>> {
        Ok(self
            .find_all()?
            .into_iter()
            .find(|node| node.identity() == identity))
    }

    /// The member at `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> DocBindResult<Option<Node>> {
        Ok(self.find_all()?.into_iter().nth(index))
    }

    /// The first member, or `None` when the sequence is empty.
    pub fn first(&self) -> DocBindResult<Option<Node>> {
        self.get(0)
    }

    /// The number of members, without materializing live nodes.
    pub fn len(&self) -> usize {
        if let Some(nodes) = self.owner.many_peek(self.association.name()) {
            return nodes.len();
        }
        self.owner
            .get(self.association.name())
            .as_ref()
            .and_then(Bson::as_array)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties the live sequence and the attribute array together.
    pub fn clear(&self) {
        self.owner.set_many(self.association.name(), Vec::new());
        self.owner
            .write_slot(self.association.name(), Bson::Array(Vec::new()));
        self.owner.sync_into_parent();
    }
}
