//! The has-one association proxy.
//!
//! Wraps a single embedded child: assignment re-parents the child and
//! mirrors its attributes into the owner's attribute tree, reads materialize
//! lazily from the attribute map and memoize on the owner. Proxies are
//! cheap, recreatable views; the owner node is the canonical state.

use bson::{Bson, Document};

use crate::{
    error::{DocBindError, DocBindResult},
    model::{Association, AssociationKind},
    node::Node,
};

/// A view over one has-one association slot on an owner node.
pub struct HasOne {
    owner: Node,
    association: Association,
}

impl Node {
    /// Returns the has-one proxy for a declared association slot.
    pub fn has_one(&self, name: &str) -> DocBindResult<HasOne> {
        let association = self
            .model()
            .association(name)
            .cloned()
            .ok_or_else(|| {
                DocBindError::AssociationNotFound(self.model().name().to_string(), name.to_string())
            })?;
        if association.kind() != AssociationKind::HasOne {
            return Err(DocBindError::AssociationKind(
                self.model().name().to_string(),
                name.to_string(),
                AssociationKind::HasOne.label(),
            ));
        }

        Ok(HasOne {
            owner: self.clone(),
            association,
        })
    }
}

impl HasOne {
    /// The wrapped child, or `None` when the slot is empty; never an error
    /// for a missing target.
    ///
    /// A live child is returned if one was already materialized; otherwise,
    /// if the owner's attribute slot holds a map, a node is materialized
    /// from it and memoized for subsequent reads.
    pub fn get(&self) -> DocBindResult<Option<Node>> {
        self.owner.materialize_one(&self.association)
    }

    /// Replaces the slot's target wholesale.
    ///
    /// With `Some(child)` the child is re-parented under the owner and its
    /// serialized form overwrites the attribute slot. With `None` the slot
    /// is cleared. Either way the previous target, if any, is left detached
    /// with a stale parent link and must not be treated as still attached.
    pub fn set(&self, target: Option<&Node>) -> DocBindResult<()> {
        match target {
            Some(child) => {
                self.owner.ensure_can_adopt(child)?;
                child.set_parent(&self.owner, self.association.name());
                self.owner
                    .write_slot(self.association.name(), Bson::Document(child.to_attributes()));
                self.owner.memoize_one(self.association.name(), child.clone());
            }
            None => {
                self.owner.write_slot(self.association.name(), Bson::Null);
                self.owner.clear_child_slot(self.association.name());
            }
        }

        self.owner.sync_into_parent();
        Ok(())
    }

    /// Constructs a new child from raw attributes and assigns it to the slot.
    pub fn build(&self, attributes: Document) -> DocBindResult<Node> {
        let child = Node::instantiate(
            self.owner.schema(),
            self.association.embedded_target(),
            attributes,
        )?;
        self.set(Some(&child))?;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::people_schema;
    use bson::doc;

    #[test]
    fn set_parentizes_and_mirrors_attributes() {
        let schema = people_schema();
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();
        let name = Node::instantiate(
            &schema,
            "name",
            doc! { "first_name": "Test", "last_name": "User" },
        )
        .unwrap();

        person.has_one("name").unwrap().set(Some(&name)).unwrap();

        assert!(name.parent().unwrap().same(&person));
        assert_eq!(
            person.to_attributes().get("name"),
            Some(&Bson::Document(doc! {
                "first_name": "Test",
                "last_name": "User",
                "_id": "test-user",
            }))
        );
    }

    #[test]
    fn set_none_clears_the_slot() {
        let schema = people_schema();
        let person = Node::instantiate(
            &schema,
            "person",
            doc! { "title": "Sir", "name": { "first_name": "Test" } },
        )
        .unwrap();

        let proxy = person.has_one("name").unwrap();
        proxy.set(None).unwrap();

        assert_eq!(person.to_attributes().get("name"), Some(&Bson::Null));
        assert!(proxy.get().unwrap().is_none());
    }

    #[test]
    fn reassignment_replaces_the_previous_target() {
        let schema = people_schema();
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();
        let first = Node::instantiate(&schema, "name", doc! { "first_name": "Old" }).unwrap();
        let second = Node::instantiate(&schema, "name", doc! { "first_name": "New" }).unwrap();

        let proxy = person.has_one("name").unwrap();
        proxy.set(Some(&first)).unwrap();
        proxy.set(Some(&second)).unwrap();

        let current = proxy.get().unwrap().unwrap();
        assert!(current.same(&second));
        // The replaced target keeps its stale parent link.
        assert!(first.parent().unwrap().same(&person));
    }

    #[test]
    fn get_memoizes_the_materialized_child() {
        let schema = people_schema();
        let person = Node::instantiate(
            &schema,
            "person",
            doc! { "title": "Sir", "name": { "first_name": "Test" } },
        )
        .unwrap();

        let first = person.has_one("name").unwrap().get().unwrap().unwrap();
        let second = person.has_one("name").unwrap().get().unwrap().unwrap();
        assert!(first.same(&second));
    }

    #[test]
    fn missing_slot_reads_as_none() {
        let schema = people_schema();
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();

        assert!(person.has_one("name").unwrap().get().unwrap().is_none());
    }

    #[test]
    fn undeclared_or_mismatched_slots_are_errors() {
        let schema = people_schema();
        let person = Node::instantiate(&schema, "person", doc! {}).unwrap();

        assert!(matches!(
            person.has_one("nicknames"),
            Err(DocBindError::AssociationNotFound(_, _))
        ));
        assert!(matches!(
            person.has_one("addresses"),
            Err(DocBindError::AssociationKind(_, _, _))
        ));
    }

    #[test]
    fn build_constructs_and_assigns() {
        let schema = people_schema();
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();

        let name = person
            .has_one("name")
            .unwrap()
            .build(doc! { "first_name": "Built" })
            .unwrap();

        assert!(name.parent().unwrap().same(&person));
        assert_eq!(
            person
                .to_attributes()
                .get("name")
                .and_then(Bson::as_document)
                .and_then(|d| d.get("first_name"))
                .and_then(Bson::as_str),
            Some("Built")
        );
    }
}
