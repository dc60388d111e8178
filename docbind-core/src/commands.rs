//! Persistence commands: save, create, destroy, and destroy-all.
//!
//! Commands are stateless procedures over a [`Database`] context and a
//! [`Node`]. The cascade rule is the heart of the engine: embedded nodes
//! never write their own document. A save anywhere in a graph delegates up
//! the parent chain, and the ancestor root issues exactly one store write
//! carrying its entire current attribute tree: whole-document overwrite,
//! never a diff.

use bson::{Document, doc};
use log::{debug, trace};

use crate::{
    backend::StoreBackend,
    callbacks::Phase,
    database::Database,
    error::{DocBindError, DocBindResult},
    node::Node,
    validation,
};

/// The result of a save or create: persisted, or rejected by validation.
///
/// Rejection is an expected outcome, not an error; callers must check it.
/// The node is carried either way; a rejected node holds the validation
/// messages in its error state.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved(Node),
    Rejected(Node),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }

    pub fn node(&self) -> &Node {
        match self {
            SaveOutcome::Saved(node) | SaveOutcome::Rejected(node) => node,
        }
    }

    pub fn into_node(self) -> Node {
        match self {
            SaveOutcome::Saved(node) | SaveOutcome::Rejected(node) => node,
        }
    }
}

/// Outcome of a best-effort destroy-all batch.
///
/// Each candidate is destroyed independently; one failure never halts the
/// remaining attempts. Failures are recorded per identity.
#[derive(Debug)]
pub struct DestroyAllReport {
    pub destroyed: usize,
    pub failures: Vec<(String, DocBindError)>,
}

impl DestroyAllReport {
    pub fn all_destroyed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Saves a document, cascading the write to the root of its graph.
///
/// Runs validation first and returns [`SaveOutcome::Rejected`] on failure.
/// Otherwise runs `before_save`, delegates to the parent when the node is
/// embedded (only the ancestor root writes, once, with its full attribute
/// tree), and runs `after_save` on this node regardless of delegation.
///
/// Store failures propagate unrecovered. A callback that re-enters save for
/// the same node gets [`DocBindError::ReentrantSave`].
pub fn save<B: StoreBackend>(db: &Database<B>, node: &Node) -> DocBindResult<SaveOutcome> {
    if !validation::execute(node) {
        debug!(
            "document {} failed validation, save rejected",
            node.identity()
        );
        return Ok(SaveOutcome::Rejected(node.clone()));
    }

    let _guard = node.begin_persist()?;
    node.run_callbacks(Phase::BeforeSave);

    match node.parent() {
        Some(parent) => {
            trace!(
                "document {} is embedded, delegating save to {}",
                node.identity(),
                parent.identity()
            );
            save(db, &parent)?;
        }
        None => {
            debug!(
                "writing document {} to collection {}",
                node.identity(),
                node.model().collection()
            );
            db.collection_for(node.model()).save(node.to_attributes())?;
        }
    }

    node.run_callbacks(Phase::AfterSave);
    Ok(SaveOutcome::Saved(node.clone()))
}

/// Creates a document: `before_create`, a full save, `after_create`.
///
/// The create callbacks run around the save unconditionally, so a rejected
/// save still sees `after_create`. The new-record hooks are distinct from
/// the generic save hooks.
pub fn create<B: StoreBackend>(db: &Database<B>, node: &Node) -> DocBindResult<SaveOutcome> {
    node.run_callbacks(Phase::BeforeCreate);
    let outcome = save(db, node)?;
    node.run_callbacks(Phase::AfterCreate);
    Ok(outcome)
}

/// Destroys a document.
///
/// A root document is removed from its collection by identity. An embedded
/// document is detached from its parent's embedded structure by identity and
/// the graph's root is rewritten with one store write, so the store reflects
/// the removal.
pub fn destroy<B: StoreBackend>(db: &Database<B>, node: &Node) -> DocBindResult<()> {
    let _guard = node.begin_persist()?;
    node.run_callbacks(Phase::BeforeDestroy);

    match node.parent_link() {
        Some((parent, association)) => {
            trace!(
                "detaching embedded document {} from {}",
                node.identity(),
                parent.identity()
            );
            parent.remove_embedded(&association, node.identity());
            node.clear_parent();

            let root = parent.ancestor_root();
            debug!(
                "rewriting root {} in collection {} after embedded destroy",
                root.identity(),
                root.model().collection()
            );
            db.collection_for(root.model()).save(root.to_attributes())?;
        }
        None => {
            debug!(
                "removing document {} from collection {}",
                node.identity(),
                node.model().collection()
            );
            db.collection_for(node.model())
                .remove(&doc! { "_id": node.identity() })?;
        }
    }

    node.run_callbacks(Phase::AfterDestroy);
    Ok(())
}

/// Destroys every document of a model matching the selector, independently.
///
/// Candidates are resolved through the query collaborator, then destroyed
/// one by one; a failing destroy is recorded and the batch continues.
pub fn destroy_all<B: StoreBackend>(
    db: &Database<B>,
    model_name: &str,
    selector: &Document,
) -> DocBindResult<DestroyAllReport> {
    let candidates = db.find_all(model_name, selector)?;
    let mut report = DestroyAllReport {
        destroyed: 0,
        failures: Vec::new(),
    };

    for node in candidates {
        match destroy(db, &node) {
            Ok(()) => report.destroyed += 1,
            Err(error) => {
                debug!(
                    "destroy of document {} failed, continuing batch: {error}",
                    node.identity()
                );
                report
                    .failures
                    .push((node.identity().to_string(), error));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Model, Schema},
        test_support::people_schema,
        validation::PresenceOf,
    };
    use bson::{Bson, doc};
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    /// Records backend calls and replays canned find results, so tests can
    /// assert on exactly what the commands wrote.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        saves: RefCell<Vec<(String, Document)>>,
        removes: RefCell<Vec<(String, Document)>>,
        canned_finds: RefCell<Vec<Document>>,
        fail_remove_on_call: Cell<Option<usize>>,
        remove_calls: Cell<usize>,
    }

    impl StoreBackend for RecordingBackend {
        fn save_document(&self, collection: &str, document: Document) -> DocBindResult<()> {
            self.saves
                .borrow_mut()
                .push((collection.to_string(), document));
            Ok(())
        }

        fn remove_documents(&self, collection: &str, selector: &Document) -> DocBindResult<u64> {
            let call = self.remove_calls.get() + 1;
            self.remove_calls.set(call);
            if self.fail_remove_on_call.get() == Some(call) {
                return Err(DocBindError::Backend("remove refused".to_string()));
            }
            self.removes
                .borrow_mut()
                .push((collection.to_string(), selector.clone()));
            Ok(1)
        }

        fn find_documents(
            &self,
            _collection: &str,
            _selector: &Document,
        ) -> DocBindResult<Vec<Document>> {
            Ok(self.canned_finds.borrow().clone())
        }

        fn create_collection(&self, _name: &str) -> DocBindResult<()> {
            Ok(())
        }

        fn drop_collection(&self, _name: &str) -> DocBindResult<()> {
            Ok(())
        }

        fn list_collections(&self) -> DocBindResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn save_rejects_invalid_documents_without_writing() {
        let schema = people_schema();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let person = Node::instantiate(&schema, "person", doc! {}).unwrap();

        let outcome = save(&db, &person).unwrap();

        assert!(!outcome.is_saved());
        assert_eq!(person.errors(), vec!["title must be present".to_string()]);
        assert!(backend.saves.borrow().is_empty());
    }

    #[test]
    fn save_writes_the_full_attribute_tree_once() {
        let schema = people_schema();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();

        let outcome = save(&db, &person).unwrap();

        assert!(outcome.is_saved());
        let saves = backend.saves.borrow();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "people");
        assert_eq!(saves[0].1, person.to_attributes());
    }

    #[test]
    fn save_on_an_embedded_grandchild_writes_only_the_root() {
        let schema = people_schema();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());

        let owner = Node::instantiate(&schema, "pet_owner", doc! { "title": "Sir" }).unwrap();
        let pet = Node::instantiate(&schema, "pet", doc! { "name": "Fido" }).unwrap();
        let visit = Node::instantiate(&schema, "vet_visit", doc! { "reason": "checkup" }).unwrap();
        owner.has_one("pet").unwrap().set(Some(&pet)).unwrap();
        pet.has_many("vet_visits").unwrap().push(&visit).unwrap();

        visit.set("reason", "surgery");
        let outcome = save(&db, &visit).unwrap();

        assert!(outcome.is_saved());
        assert!(outcome.node().same(&visit));
        let saves = backend.saves.borrow();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "pet_owners");
        let written = &saves[0].1;
        let reason = written
            .get("pet")
            .and_then(Bson::as_document)
            .and_then(|pet| pet.get("vet_visits"))
            .and_then(Bson::as_array)
            .and_then(|visits| visits.first())
            .and_then(Bson::as_document)
            .and_then(|visit| visit.get("reason"))
            .and_then(Bson::as_str);
        assert_eq!(reason, Some("surgery"));
    }

    #[test]
    fn save_runs_callbacks_around_the_write() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let before = order.clone();
        let after = order.clone();

        let schema = Schema::builder()
            .model(
                Model::builder("comment")
                    .key("text")
                    .callback(Phase::BeforeSave, move |_| {
                        before.borrow_mut().push("before_save");
                    })
                    .callback(Phase::AfterSave, move |_| {
                        after.borrow_mut().push("after_save");
                    })
                    .build(),
            )
            .build()
            .unwrap();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let comment = Node::instantiate(&schema, "comment", doc! { "text": "Testing" }).unwrap();

        save(&db, &comment).unwrap();

        assert_eq!(*order.borrow(), vec!["before_save", "after_save"]);
        assert_eq!(backend.saves.borrow().len(), 1);
    }

    #[test]
    fn create_wraps_save_with_create_callbacks() {
        let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let hooks: Vec<(Phase, &'static str)> = vec![
            (Phase::BeforeCreate, "before_create"),
            (Phase::BeforeSave, "before_save"),
            (Phase::AfterSave, "after_save"),
            (Phase::AfterCreate, "after_create"),
        ];

        let mut builder = Model::builder("comment").key("text");
        for (phase, label) in hooks {
            let order = order.clone();
            builder = builder.callback(phase, move |_| order.borrow_mut().push(label));
        }

        let schema = Schema::builder().model(builder.build()).build().unwrap();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let comment = Node::instantiate(&schema, "comment", doc! { "text": "Testing" }).unwrap();

        let outcome = create(&db, &comment).unwrap();

        assert!(outcome.is_saved());
        assert_eq!(
            *order.borrow(),
            vec!["before_create", "before_save", "after_save", "after_create"]
        );
    }

    #[test]
    fn create_runs_after_create_even_when_rejected() {
        let ran: Rc<Cell<bool>> = Rc::default();
        let observed = ran.clone();

        let schema = Schema::builder()
            .model(
                Model::builder("comment")
                    .key("text")
                    .validates(PresenceOf::new("text"))
                    .callback(Phase::AfterCreate, move |_| observed.set(true))
                    .build(),
            )
            .build()
            .unwrap();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let comment = Node::instantiate(&schema, "comment", doc! {}).unwrap();

        let outcome = create(&db, &comment).unwrap();

        assert!(!outcome.is_saved());
        assert!(ran.get());
        assert!(backend.saves.borrow().is_empty());
    }

    #[test]
    fn reentrant_save_from_a_callback_is_rejected() {
        let observed: Rc<RefCell<Option<bool>>> = Rc::default();
        let db_slot: Rc<RefCell<Option<Rc<Database<Rc<RecordingBackend>>>>>> = Rc::default();

        let slot = db_slot.clone();
        let seen = observed.clone();
        let schema = Schema::builder()
            .model(
                Model::builder("comment")
                    .key("text")
                    .callback(Phase::BeforeSave, move |node| {
                        if let Some(db) = &*slot.borrow() {
                            let result = save(db, node);
                            *seen.borrow_mut() =
                                Some(matches!(result, Err(DocBindError::ReentrantSave(_))));
                        }
                    })
                    .build(),
            )
            .build()
            .unwrap();

        let backend = Rc::new(RecordingBackend::default());
        let db = Rc::new(Database::new(schema.clone(), backend.clone()));
        *db_slot.borrow_mut() = Some(db.clone());
        let comment = Node::instantiate(&schema, "comment", doc! { "text": "Testing" }).unwrap();

        let outcome = save(&db, &comment).unwrap();

        assert!(outcome.is_saved());
        assert_eq!(*observed.borrow(), Some(true));
        // The outer save still issued its single write.
        assert_eq!(backend.saves.borrow().len(), 1);
    }

    #[test]
    fn destroy_on_a_root_removes_by_identity() {
        let schema = people_schema();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();

        destroy(&db, &person).unwrap();

        let removes = backend.removes.borrow();
        assert_eq!(removes.len(), 1);
        assert_eq!(removes[0].0, "people");
        assert_eq!(removes[0].1, doc! { "_id": "sir" });
        assert!(backend.saves.borrow().is_empty());
    }

    #[test]
    fn destroy_on_an_embedded_child_detaches_and_rewrites_the_root() {
        let schema = people_schema();
        let backend = Rc::new(RecordingBackend::default());
        let db = Database::new(schema.clone(), backend.clone());
        let person = Node::instantiate(&schema, "person", doc! { "title": "Sir" }).unwrap();
        let address = Node::instantiate(&schema, "address", doc! { "street": "King St" }).unwrap();
        person.has_many("addresses").unwrap().push(&address).unwrap();

        destroy(&db, &address).unwrap();

        assert!(address.parent().is_none());
        assert_eq!(
            person.to_attributes().get("addresses"),
            Some(&Bson::Array(Vec::new()))
        );
        assert!(backend.removes.borrow().is_empty());
        let saves = backend.saves.borrow();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, "people");
        assert_eq!(saves[0].1, person.to_attributes());
    }

    #[test]
    fn destroy_all_attempts_every_candidate_despite_failures() {
        let schema = people_schema();
        let backend = Rc::new(RecordingBackend::default());
        backend.canned_finds.borrow_mut().extend([
            doc! { "_id": "one", "title": "Sir" },
            doc! { "_id": "two", "title": "Sir" },
            doc! { "_id": "three", "title": "Sir" },
        ]);
        backend.fail_remove_on_call.set(Some(2));
        let db = Database::new(schema.clone(), backend.clone());

        let report = destroy_all(&db, "person", &doc! { "title": "Sir" }).unwrap();

        // The failing second destroy did not stop the third attempt.
        assert_eq!(backend.remove_calls.get(), 3);
        assert_eq!(report.destroyed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "two");
        assert!(!report.all_destroyed());
    }
}
