//! Declaration-time schema: models, association descriptors, and the
//! schema registry.
//!
//! Associations are declared as a closed, tagged set at schema-definition
//! time: each site names its kind, its attribute path, and (for embedded
//! kinds) the concrete target model. Polymorphic parents need no open-ended
//! typing: any model may declare an association targeting the child, and
//! the belongs-to side resolves the inverse slot against whichever parent
//! it is handed.

use std::{collections::HashMap, fmt, rc::Rc};

use crate::{
    callbacks::{Callback, Phase},
    error::{DocBindError, DocBindResult},
    validation::Validation,
};

/// The three association kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// Zero-or-one embedded child document.
    HasOne,
    /// An ordered sequence of embedded child documents.
    HasMany,
    /// A non-owning reference to the embedding parent.
    BelongsTo,
}

impl AssociationKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            AssociationKind::HasOne => "has-one",
            AssociationKind::HasMany => "has-many",
            AssociationKind::BelongsTo => "belongs-to",
        }
    }
}

/// Declaration-time metadata describing one association site.
#[derive(Debug, Clone)]
pub struct Association {
    name: String,
    kind: AssociationKind,
    target: Option<String>,
    inverse: Option<String>,
}

impl Association {
    /// Declares a one-to-one embedded child stored under `name`,
    /// materialized as the `target` model.
    pub fn has_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::HasOne,
            target: Some(target.into()),
            inverse: None,
        }
    }

    /// Declares a one-to-many embedded sequence stored under `name`,
    /// each entry materialized as the `target` model.
    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::HasMany,
            target: Some(target.into()),
            inverse: None,
        }
    }

    /// Declares a reference back to the embedding parent. The parent's type
    /// is open: any model declaring an association targeting this model can
    /// act as the parent.
    pub fn belongs_to(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::BelongsTo,
            target: None,
            inverse: None,
        }
    }

    /// Overrides the name of the inverse association on the parent model,
    /// for belongs-to sites where target-scanning is ambiguous.
    pub fn inverse(mut self, name: impl Into<String>) -> Self {
        self.inverse = Some(name.into());
        self
    }

    /// The attribute path this association occupies on the owner.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    /// The target model name, present on embedded kinds.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn inverse_name(&self) -> Option<&str> {
        self.inverse.as_deref()
    }

    pub(crate) fn embedded_target(&self) -> &str {
        self.target
            .as_deref()
            .expect("embedded associations always carry a target")
    }
}

/// Declaration-time metadata for one document type.
///
/// A model names its storage collection, the key fields its slug identity is
/// derived from, its association sites, and the validations and lifecycle
/// callbacks the persistence commands invoke.
pub struct Model {
    name: String,
    collection: String,
    key_fields: Vec<String>,
    associations: Vec<Association>,
    validations: Vec<Box<dyn Validation>>,
    callbacks: HashMap<Phase, Vec<Callback>>,
}

impl Model {
    /// Creates a builder for a model with the given logical name.
    ///
    /// The collection name defaults to the model name with an `s` appended;
    /// override it with [`ModelBuilder::collection`].
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        let name = name.into();
        let collection = format!("{name}s");
        ModelBuilder {
            model: Model {
                name,
                collection,
                key_fields: Vec::new(),
                associations: Vec::new(),
                validations: Vec::new(),
                callbacks: HashMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// Association descriptors in declaration order.
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Looks up an association by its attribute path.
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub(crate) fn validations(&self) -> &[Box<dyn Validation>] {
        &self.validations
    }

    pub(crate) fn callbacks(&self, phase: Phase) -> &[Callback] {
        self.callbacks
            .get(&phase)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("associations", &self.associations)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Model`] declarations.
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    /// Sets the backing collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.model.collection = name.into();
        self
    }

    /// Adds a field whose value participates in slug identity generation.
    pub fn key(mut self, field: impl Into<String>) -> Self {
        self.model.key_fields.push(field.into());
        self
    }

    /// Declares an association from a prebuilt descriptor.
    pub fn association(mut self, association: Association) -> Self {
        self.model.associations.push(association);
        self
    }

    /// Declares a one-to-one embedded child.
    pub fn has_one(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.association(Association::has_one(name, target))
    }

    /// Declares a one-to-many embedded sequence.
    pub fn has_many(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.association(Association::has_many(name, target))
    }

    /// Declares a reference back to the embedding parent.
    pub fn belongs_to(self, name: impl Into<String>) -> Self {
        self.association(Association::belongs_to(name))
    }

    /// Registers a validation rule, run in registration order at save time.
    pub fn validates(mut self, rule: impl Validation + 'static) -> Self {
        self.model.validations.push(Box::new(rule));
        self
    }

    /// Registers a lifecycle callback for the given phase.
    pub fn callback(mut self, phase: Phase, handler: impl Fn(&crate::node::Node) + 'static) -> Self {
        self.model
            .callbacks
            .entry(phase)
            .or_default()
            .push(Rc::new(handler));
        self
    }

    pub fn build(self) -> Model {
        self.model
    }
}

/// Immutable registry of every model participating in a document graph.
#[derive(Debug)]
pub struct Schema {
    models: HashMap<String, Rc<Model>>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { models: Vec::new() }
    }

    /// Looks up a registered model by name.
    pub fn model(&self, name: &str) -> DocBindResult<Rc<Model>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| DocBindError::ModelNotFound(name.to_string()))
    }

    /// Names of all registered models.
    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}

/// Builder for [`Schema`] registries.
///
/// `build` verifies that every embedded association targets a registered
/// model, so materialization can never encounter an unknown type at runtime.
pub struct SchemaBuilder {
    models: Vec<Model>,
}

impl SchemaBuilder {
    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn build(self) -> DocBindResult<Rc<Schema>> {
        let mut models = HashMap::with_capacity(self.models.len());
        for model in self.models {
            models.insert(model.name.clone(), Rc::new(model));
        }

        for model in models.values() {
            for association in &model.associations {
                if let Some(target) = association.target() {
                    if !models.contains_key(target) {
                        return Err(DocBindError::ModelNotFound(target.to_string()));
                    }
                }
            }
        }

        Ok(Rc::new(Schema { models }))
    }
}
