//! The document graph node.
//!
//! A [`Node`] is a cheap, clonable handle over one document in a graph: an
//! ordered attribute tree plus live links to the nodes embedded in it.
//! Parents hold their children strongly through memoized child slots;
//! children hold their parent weakly, so the graph can never leak through a
//! reference cycle and the parent chain is guaranteed to terminate.
//!
//! The attribute tree and the object graph are kept in lockstep: every
//! mutation that completes leaves each live child serialized, by identity,
//! at its association path inside every ancestor's attributes.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use bson::{Bson, Document};
use serde_json::Value;

use crate::{
    callbacks::{self, Phase},
    error::{DocBindError, DocBindResult},
    model::{Association, AssociationKind, Model, Schema},
    slug,
};

/// A handle to one document in a graph.
///
/// Cloning a `Node` clones the handle, not the document: all clones observe
/// and mutate the same attribute tree. Use [`Node::same`] for handle
/// identity and `==` for structural equality.
#[derive(Clone)]
pub struct Node(Rc<NodeCell>);

struct NodeCell {
    schema: Rc<Schema>,
    model: Rc<Model>,
    identity: String,
    attributes: RefCell<Document>,
    parent: RefCell<Option<ParentLink>>,
    children: RefCell<HashMap<String, ChildSlot>>,
    errors: RefCell<Vec<String>>,
    saving: Cell<bool>,
}

struct ParentLink {
    node: Weak<NodeCell>,
    association: String,
}

enum ChildSlot {
    One(Node),
    Many(Vec<Node>),
}

impl Node {
    /// Builds a node of the named model from an attribute map, recursively
    /// materializing every embedded child declared on the model and linking
    /// each child back to the new node.
    ///
    /// Identity is fixed here, once: an explicit `_id` wins, otherwise the
    /// model's key fields are slugified, otherwise a UUID is generated. The
    /// resulting identity is written into the attributes as `_id` and never
    /// recomputed, even if the underlying fields are mutated later.
    pub fn instantiate(
        schema: &Rc<Schema>,
        model_name: &str,
        attributes: Document,
    ) -> DocBindResult<Self> {
        let model = schema.model(model_name)?;
        let identity = identity_for(&model, &attributes);

        let mut attributes = attributes;
        attributes.insert("_id", identity.clone());

        let node = Node(Rc::new(NodeCell {
            schema: schema.clone(),
            model,
            identity,
            attributes: RefCell::new(attributes),
            parent: RefCell::new(None),
            children: RefCell::new(HashMap::new()),
            errors: RefCell::new(Vec::new()),
            saving: Cell::new(false),
        }));
        node.materialize_embedded()?;

        Ok(node)
    }

    /// The model this node was declared as.
    pub fn model(&self) -> &Rc<Model> {
        &self.0.model
    }

    /// The schema registry this node was built against.
    pub fn schema(&self) -> &Rc<Schema> {
        &self.0.schema
    }

    /// The node's stable identity key, also stored as its `_id` attribute.
    pub fn identity(&self) -> &str {
        &self.0.identity
    }

    /// Whether two handles refer to the same underlying document.
    pub fn same(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Reads a single attribute.
    pub fn get(&self, field: &str) -> Option<Bson> {
        self.0.attributes.borrow().get(field).cloned()
    }

    /// Reads a single attribute as a string.
    pub fn get_str(&self, field: &str) -> Option<String> {
        match self.get(field) {
            Some(Bson::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Writes a single attribute and rewrites this node's serialized form
    /// inside every ancestor, so the graph and the attribute trees stay in
    /// sync. Writing `_id` does not change the node's identity.
    pub fn set(&self, field: &str, value: impl Into<Bson>) {
        self.0.attributes.borrow_mut().insert(field, value.into());
        self.sync_into_parent();
    }

    /// Serializes this node and all embedded descendants into a plain
    /// attribute tree.
    pub fn to_attributes(&self) -> Document {
        self.0.attributes.borrow().clone()
    }

    /// Serializes the attribute tree as JSON.
    pub fn to_json(&self) -> DocBindResult<Value> {
        Ok(serde_json::to_value(&*self.0.attributes.borrow())?)
    }

    /// The node embedding this one, if any.
    pub fn parent(&self) -> Option<Node> {
        self.parent_link().map(|(parent, _)| parent)
    }

    /// The association path on the parent under which this node is embedded.
    pub fn parent_association(&self) -> Option<String> {
        self.parent_link().map(|(_, association)| association)
    }

    /// Walks parent links to the top of the graph; returns self when this
    /// node is already a root. Terminates because re-parenting refuses to
    /// introduce back-edges.
    pub fn ancestor_root(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Messages collected by the most recent validation run.
    pub fn errors(&self) -> Vec<String> {
        self.0.errors.borrow().clone()
    }

    /// Replaces the full attribute tree (keeping identity) and rebuilds the
    /// embedded children from the new attributes. Used by reload.
    pub fn replace_attributes(&self, attributes: Document) -> DocBindResult<()> {
        let mut attributes = attributes;
        attributes.insert("_id", self.0.identity.clone());

        *self.0.attributes.borrow_mut() = attributes;
        self.0.children.borrow_mut().clear();
        self.materialize_embedded()?;
        self.sync_into_parent();

        Ok(())
    }

    fn materialize_embedded(&self) -> DocBindResult<()> {
        let associations = self.0.model.associations().to_vec();
        for association in &associations {
            match association.kind() {
                AssociationKind::HasOne => {
                    self.materialize_one(association)?;
                }
                AssociationKind::HasMany => {
                    let present = self
                        .0
                        .attributes
                        .borrow()
                        .get(association.name())
                        .is_some();
                    if present {
                        self.materialize_many(association)?;
                    }
                }
                AssociationKind::BelongsTo => {}
            }
        }
        Ok(())
    }

    /// Returns the live child in a has-one slot, materializing (and
    /// memoizing) it from the attribute map when necessary.
    pub(crate) fn materialize_one(&self, association: &Association) -> DocBindResult<Option<Node>> {
        if let Some(child) = self.child_one_peek(association.name()) {
            return Ok(Some(child));
        }

        let raw = self
            .0
            .attributes
            .borrow()
            .get(association.name())
            .and_then(Bson::as_document)
            .cloned();
        let Some(raw) = raw else {
            return Ok(None);
        };

        let child = Node::instantiate(&self.0.schema, association.embedded_target(), raw)?;
        child.set_parent(self, association.name());
        self.0
            .attributes
            .borrow_mut()
            .insert(association.name(), child.to_attributes());
        self.memoize_one(association.name(), child.clone());

        Ok(Some(child))
    }

    /// Returns the live children in a has-many slot, materializing (and
    /// memoizing) the sequence from the attribute array when necessary.
    /// Entries that are not documents are skipped.
    pub(crate) fn materialize_many(&self, association: &Association) -> DocBindResult<Vec<Node>> {
        if let Some(nodes) = self.many_peek(association.name()) {
            return Ok(nodes);
        }

        let raw = self
            .0
            .attributes
            .borrow()
            .get(association.name())
            .and_then(Bson::as_array)
            .cloned();
        let Some(raw) = raw else {
            self.set_many(association.name(), Vec::new());
            return Ok(Vec::new());
        };

        let mut nodes = Vec::with_capacity(raw.len());
        let mut serialized = Vec::with_capacity(raw.len());
        for entry in raw {
            if let Bson::Document(map) = entry {
                let child = Node::instantiate(&self.0.schema, association.embedded_target(), map)?;
                child.set_parent(self, association.name());
                serialized.push(Bson::Document(child.to_attributes()));
                nodes.push(child);
            }
        }

        self.0
            .attributes
            .borrow_mut()
            .insert(association.name(), Bson::Array(serialized));
        self.set_many(association.name(), nodes.clone());

        Ok(nodes)
    }

    pub(crate) fn set_parent(&self, parent: &Node, association: &str) {
        *self.0.parent.borrow_mut() = Some(ParentLink {
            node: Rc::downgrade(&parent.0),
            association: association.to_string(),
        });
    }

    pub(crate) fn clear_parent(&self) {
        *self.0.parent.borrow_mut() = None;
    }

    pub(crate) fn parent_link(&self) -> Option<(Node, String)> {
        let link = self.0.parent.borrow();
        link.as_ref().and_then(|link| {
            link.node
                .upgrade()
                .map(|cell| (Node(cell), link.association.clone()))
        })
    }

    /// Refuses adoption that would make `child` an ancestor of itself.
    /// `self` is the prospective parent; its chain (including itself) must
    /// not contain the child.
    pub(crate) fn ensure_can_adopt(&self, child: &Node) -> DocBindResult<()> {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            if node.same(child) {
                return Err(DocBindError::CircularGraph(child.identity().to_string()));
            }
            cursor = node.parent();
        }
        Ok(())
    }

    /// Rewrites this node's serialized form at its slot in the parent, then
    /// propagates the change up the chain. No-op for roots.
    pub(crate) fn sync_into_parent(&self) {
        let Some((parent, association_name)) = self.parent_link() else {
            return;
        };
        let Some(association) = parent.model().association(&association_name).cloned() else {
            return;
        };

        match association.kind() {
            AssociationKind::HasOne => {
                let serialized = self.to_attributes();
                parent
                    .0
                    .attributes
                    .borrow_mut()
                    .insert(association.name(), serialized);
            }
            AssociationKind::HasMany => parent.upsert_embedded_entry(association.name(), self),
            AssociationKind::BelongsTo => {}
        }

        parent.sync_into_parent();
    }

    /// Identity-keyed upsert of a child's serialized form into an attribute
    /// array. Replaces the matching entry if one exists, appends otherwise.
    pub(crate) fn upsert_embedded_entry(&self, name: &str, child: &Node) {
        let serialized = Bson::Document(child.to_attributes());
        let mut attributes = self.0.attributes.borrow_mut();
        let mut array = attributes
            .get(name)
            .and_then(Bson::as_array)
            .cloned()
            .unwrap_or_default();

        match array
            .iter_mut()
            .find(|entry| entry_identity(entry) == Some(child.identity()))
        {
            Some(slot) => *slot = serialized,
            None => array.push(serialized),
        }

        attributes.insert(name, Bson::Array(array));
    }

    /// Positional append of a child's serialized form into an attribute
    /// array, with no identity deduplication.
    pub(crate) fn append_embedded_entry(&self, name: &str, child: &Node) {
        let serialized = Bson::Document(child.to_attributes());
        let mut attributes = self.0.attributes.borrow_mut();
        let mut array = attributes
            .get(name)
            .and_then(Bson::as_array)
            .cloned()
            .unwrap_or_default();
        array.push(serialized);
        attributes.insert(name, Bson::Array(array));
    }

    /// Detaches the child with the given identity from an association slot,
    /// in both the live graph and the attribute tree, and propagates the
    /// change upward.
    pub(crate) fn remove_embedded(&self, association_name: &str, identity: &str) {
        let kind = self
            .model()
            .association(association_name)
            .map(Association::kind);

        {
            let mut children = self.0.children.borrow_mut();
            match children.get_mut(association_name) {
                Some(ChildSlot::Many(nodes)) => nodes.retain(|node| node.identity() != identity),
                Some(ChildSlot::One(node)) if node.identity() == identity => {
                    children.remove(association_name);
                }
                _ => {}
            }
        }

        {
            let mut attributes = self.0.attributes.borrow_mut();
            match kind {
                Some(AssociationKind::HasMany) => {
                    let array = attributes
                        .get(association_name)
                        .and_then(Bson::as_array)
                        .cloned()
                        .unwrap_or_default();
                    let remaining: Vec<Bson> = array
                        .into_iter()
                        .filter(|entry| entry_identity(entry) != Some(identity))
                        .collect();
                    attributes.insert(association_name, Bson::Array(remaining));
                }
                Some(AssociationKind::HasOne) => {
                    let matches = attributes
                        .get(association_name)
                        .and_then(Bson::as_document)
                        .and_then(|entry| entry.get("_id"))
                        .and_then(Bson::as_str)
                        == Some(identity);
                    if matches {
                        attributes.insert(association_name, Bson::Null);
                    }
                }
                _ => {}
            }
        }

        self.sync_into_parent();
    }

    pub(crate) fn child_one_peek(&self, name: &str) -> Option<Node> {
        match self.0.children.borrow().get(name) {
            Some(ChildSlot::One(node)) => Some(node.clone()),
            _ => None,
        }
    }

    pub(crate) fn many_peek(&self, name: &str) -> Option<Vec<Node>> {
        match self.0.children.borrow().get(name) {
            Some(ChildSlot::Many(nodes)) => Some(nodes.clone()),
            _ => None,
        }
    }

    pub(crate) fn memoize_one(&self, name: &str, child: Node) {
        self.0
            .children
            .borrow_mut()
            .insert(name.to_string(), ChildSlot::One(child));
    }

    pub(crate) fn set_many(&self, name: &str, nodes: Vec<Node>) {
        self.0
            .children
            .borrow_mut()
            .insert(name.to_string(), ChildSlot::Many(nodes));
    }

    pub(crate) fn push_many(&self, name: &str, child: Node) {
        let mut children = self.0.children.borrow_mut();
        match children.get_mut(name) {
            Some(ChildSlot::Many(nodes)) => nodes.push(child),
            _ => {
                children.insert(name.to_string(), ChildSlot::Many(vec![child]));
            }
        }
    }

    pub(crate) fn upsert_many(&self, name: &str, child: Node) {
        let mut children = self.0.children.borrow_mut();
        match children.get_mut(name) {
            Some(ChildSlot::Many(nodes)) => {
                match nodes
                    .iter_mut()
                    .find(|node| node.identity() == child.identity())
                {
                    Some(slot) => *slot = child,
                    None => nodes.push(child),
                }
            }
            _ => {
                children.insert(name.to_string(), ChildSlot::Many(vec![child]));
            }
        }
    }

    pub(crate) fn clear_child_slot(&self, name: &str) {
        self.0.children.borrow_mut().remove(name);
    }

    /// Writes an attribute slot without propagating to ancestors. Callers
    /// finish the mutation with [`Node::sync_into_parent`].
    pub(crate) fn write_slot(&self, name: &str, value: Bson) {
        self.0.attributes.borrow_mut().insert(name, value);
    }

    pub(crate) fn clear_errors(&self) {
        self.0.errors.borrow_mut().clear();
    }

    pub(crate) fn add_error(&self, message: String) {
        self.0.errors.borrow_mut().push(message);
    }

    pub(crate) fn run_callbacks(&self, phase: Phase) {
        let model = self.0.model.clone();
        callbacks::run(&model, self, phase);
    }

    /// Marks the node as mid-persist for the duration of the returned guard.
    /// A second call before the guard drops means a callback re-entered the
    /// persistence command for this node.
    pub(crate) fn begin_persist(&self) -> DocBindResult<PersistGuard> {
        if self.0.saving.replace(true) {
            return Err(DocBindError::ReentrantSave(self.identity().to_string()));
        }
        Ok(PersistGuard {
            cell: self.0.clone(),
        })
    }
}

pub(crate) struct PersistGuard {
    cell: Rc<NodeCell>,
}

impl Drop for PersistGuard {
    fn drop(&mut self) {
        self.cell.saving.set(false);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.0.model.name() == other.0.model.name()
            && *self.0.attributes.borrow() == *other.0.attributes.borrow()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("model", &self.0.model.name())
            .field("identity", &self.0.identity)
            .field("attributes", &*self.0.attributes.borrow())
            .finish()
    }
}

fn identity_for(model: &Model, attributes: &Document) -> String {
    match attributes.get("_id") {
        Some(Bson::String(id)) if !id.is_empty() => return id.clone(),
        Some(Bson::Int32(id)) => return id.to_string(),
        Some(Bson::Int64(id)) => return id.to_string(),
        _ => {}
    }

    let joined = model
        .key_fields()
        .iter()
        .filter_map(|field| attributes.get(field))
        .filter_map(key_fragment)
        .collect::<Vec<_>>()
        .join(" ");
    let slugged = slug::slugify(&joined);

    if slugged.is_empty() {
        slug::generated_id()
    } else {
        slugged
    }
}

fn key_fragment(value: &Bson) -> Option<String> {
    match value {
        Bson::String(text) if !text.is_empty() => Some(text.clone()),
        Bson::Int32(number) => Some(number.to_string()),
        Bson::Int64(number) => Some(number.to_string()),
        _ => None,
    }
}

fn entry_identity(entry: &Bson) -> Option<&str> {
    entry
        .as_document()
        .and_then(|document| document.get("_id"))
        .and_then(Bson::as_str)
}
