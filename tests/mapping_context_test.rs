//! Integration tests for registration, lookup, dirty checking and clearing

mod common;

use common::{context, knows, person};
use samyama_ogm::{
    ChangeTracker, Entity, EntityRef, Label, LabelHistory, MappingContext, RelationshipRecord,
    TypeName,
};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

#[test]
fn test_first_registration_wins() {
    let mut ctx = context();
    let original = person(1);
    let duplicate = person(1);

    ctx.register_node(original.clone()).unwrap();
    let returned = ctx.register_node(duplicate.clone()).unwrap();

    // Node registration hands back the argument, not the tracked instance
    assert!(returned.ptr_eq(&duplicate));
    assert_eq!(ctx.node_count(), 1);
    assert!(ctx.lookup_node(1).unwrap().ptr_eq(&original));
}

#[test]
fn test_relationship_entity_canonicalization() {
    let mut ctx = context();
    let a = person(1);
    let b = person(2);
    let first = knows(10, &a, &b);
    let second = knows(10, &a, &b);

    let tracked = ctx.register_relationship_entity(first.clone(), 10);
    assert!(tracked.ptr_eq(&first));

    let tracked = ctx.register_relationship_entity(second, 10);
    assert!(tracked.ptr_eq(&first));
    assert_eq!(ctx.relationship_entity_count(), 1);
}

#[test]
fn test_replace_relationship_entity() {
    let mut ctx = context();
    let a = person(1);
    let b = person(2);
    let first = knows(10, &a, &b);
    let second = knows(10, &b, &a);
    ctx.register_relationship_entity(first, 10);

    ctx.add_relationship(RelationshipRecord::new(1, 2, "KNOWS", Some(10)));

    let tracked = ctx.replace_relationship_entity(second.clone(), 10);
    assert!(tracked.ptr_eq(&second));
    assert!(ctx.lookup_relationship_entity(10).unwrap().ptr_eq(&second));
    // The id is still registered, so its record stays valid
    assert!(ctx.contains_relationship(&RelationshipRecord::new(1, 2, "KNOWS", Some(10))));
}

#[test]
fn test_same_type_primary_key_first_write_wins() {
    let mut ctx = context();
    let first = person(1);
    let second = Entity::new("Person")
        .with_id(2)
        .with_property("email", "person1@example.com")
        .into_ref();
    ctx.register_node(first.clone()).unwrap();
    ctx.register_node(second.clone()).unwrap();

    assert_eq!(ctx.node_count(), 2);
    assert!(ctx.lookup_node("person1@example.com").unwrap().ptr_eq(&first));
    assert!(ctx.lookup_node(2).unwrap().ptr_eq(&second));

    // Removing the later node leaves the first one's key in place
    ctx.remove_entity(&second).unwrap();
    assert!(ctx.lookup_node("person1@example.com").unwrap().ptr_eq(&first));
    let by_type = ctx
        .lookup_node_by_key(&TypeName::new("Person"), "person1@example.com")
        .unwrap()
        .unwrap();
    assert!(by_type.ptr_eq(&first));

    ctx.remove_entity(&first).unwrap();
    assert!(ctx.lookup_node("person1@example.com").is_none());
}

#[test]
fn test_replace_node_keeps_dependent_relationships() {
    let mut ctx = context();
    let a = person(1);
    let b = person(2);
    ctx.register_node(a.clone()).unwrap();
    ctx.register_node(b.clone()).unwrap();
    ctx.register_relationship_entity(knows(10, &a, &b), 10);
    ctx.add_relationship(RelationshipRecord::new(1, 2, "KNOWS", Some(10)));

    ctx.replace_node(a.clone()).unwrap();

    assert!(ctx.lookup_node(1).unwrap().ptr_eq(&a));
    assert!(ctx.lookup_relationship_entity(10).is_some());
    assert!(ctx.contains_relationship(&RelationshipRecord::new(1, 2, "KNOWS", Some(10))));
}

#[test]
fn test_relationship_records() {
    let mut ctx = context();
    let a = person(1);
    let b = person(2);
    ctx.register_relationship_entity(knows(10, &a, &b), 10);

    let backed = RelationshipRecord::new(1, 2, "KNOWS", Some(10));
    let structural = RelationshipRecord::structural(2, 3, "LIKES");
    ctx.add_relationship(backed.clone());
    ctx.add_relationship(structural.clone());
    ctx.add_relationship(structural.clone());

    assert_eq!(ctx.relationship_count(), 2);
    assert!(ctx.contains_relationship(&backed));
    assert!(ctx.all_relationships().contains(&structural));

    assert!(ctx.remove_relationship(&structural));
    assert!(!ctx.remove_relationship(&structural));
    assert_eq!(ctx.relationship_count(), 1);
}

#[test]
fn test_dirty_checking() {
    let mut ctx = context();
    let alice = person(1);
    ctx.register_node(alice.clone()).unwrap();
    assert!(!ctx.is_dirty(&alice));

    alice.borrow_mut().set_property("name", "Alice");
    assert!(ctx.is_dirty(&alice));

    alice.borrow_mut().remove_property("name");
    assert!(!ctx.is_dirty(&alice));

    let stranger = person(99);
    assert!(ctx.is_dirty(&stranger));
}

#[test]
fn test_label_history() {
    let mut ctx = context();
    let alice = person(1);
    ctx.register_node(alice.clone()).unwrap();

    alice.borrow_mut().add_label("Admin");
    alice.borrow_mut().remove_label(&Label::new("Person"));

    let history = ctx.label_history(&alice);
    assert_eq!(history.added(), BTreeSet::from([Label::new("Admin")]));
    assert_eq!(history.removed(), BTreeSet::from([Label::new("Person")]));
}

#[test]
fn test_clear_discards_everything() {
    let mut ctx = context();
    let a = person(1);
    let b = person(2);
    ctx.register_node(a.clone()).unwrap();
    ctx.register_node(b.clone()).unwrap();
    ctx.register_relationship_entity(knows(10, &a, &b), 10);
    ctx.add_relationship(RelationshipRecord::new(1, 2, "KNOWS", Some(10)));

    ctx.clear();

    assert!(ctx.is_empty());
    assert_eq!(ctx.node_count(), 0);
    assert_eq!(ctx.relationship_entity_count(), 0);
    assert!(ctx.all_relationships().is_empty());
    assert!(ctx.lookup_node("person1@example.com").is_none());
    // Behaves as if never registered
    assert!(ctx.is_dirty(&a));
    assert!(ctx.label_history(&a).previous().is_empty());
}

#[test]
fn test_all_entities_of_is_polymorphic() {
    let mut ctx = context();
    let alice = person(1);
    let employee = Entity::new("Employee").with_id(2).into_ref();
    let acme = Entity::new("Company").with_id(3).into_ref();
    for node in [&alice, &employee, &acme] {
        ctx.register_node(node.clone()).unwrap();
    }
    let works_at = Entity::new("WorksAt")
        .with_id(20)
        .with_reference("employee", &employee)
        .with_reference("company", &acme)
        .into_ref();
    ctx.register_relationship_entity(works_at.clone(), 20);

    let people = ctx.all_entities_of(&TypeName::new("Person")).unwrap();
    assert_eq!(people, vec![alice.clone(), employee.clone()]);

    let employees = ctx.all_entities_of(&TypeName::new("Employee")).unwrap();
    assert_eq!(employees, vec![employee.clone()]);

    let named = ctx.all_entities_of(&TypeName::new("Named")).unwrap();
    assert_eq!(named.len(), 3);

    let relationships = ctx.all_entities_of(&TypeName::new("WorksAt")).unwrap();
    assert_eq!(relationships, vec![works_at]);
    assert!(ctx.all_entities_of(&TypeName::new("Knows")).unwrap().is_empty());
}

#[test]
fn test_unindexable_primary_key_is_skipped() {
    common::init_tracing();
    let mut ctx = context();
    let odd = Entity::new("Person")
        .with_id(5)
        .with_property("email", 1.5)
        .into_ref();

    ctx.register_node(odd.clone()).unwrap();

    assert!(ctx.lookup_node(5).unwrap().ptr_eq(&odd));
    assert!(ctx
        .lookup_node_by_key(&TypeName::new("Person"), "1.5")
        .unwrap()
        .is_none());
}

#[test]
fn test_subtype_found_by_inherited_primary_index() {
    let mut ctx = context();
    let employee = Entity::new("Employee")
        .with_id(7)
        .with_property("email", "dana@example.com")
        .into_ref();
    ctx.register_node(employee.clone()).unwrap();

    let found = ctx
        .lookup_node_by_key(&TypeName::new("Person"), "dana@example.com")
        .unwrap()
        .unwrap();
    assert!(found.ptr_eq(&employee));
    assert!(ctx
        .lookup_node_by_key(&TypeName::new("Company"), "dana@example.com")
        .unwrap()
        .is_none());
}

/// Tracker whose verdict is controlled by the test
struct ScriptedTracker {
    unchanged: Rc<Cell<bool>>,
    remembered: usize,
}

impl ChangeTracker for ScriptedTracker {
    fn remember(&mut self, _entity: &Entity) {
        self.remembered += 1;
    }

    fn remembered(&self, _entity: &Entity) -> bool {
        self.unchanged.get()
    }

    fn label_history(&self, entity: &Entity) -> LabelHistory {
        LabelHistory::new(Default::default(), entity.labels().clone())
    }

    fn clear(&mut self) {
        self.remembered = 0;
    }

    fn len(&self) -> usize {
        self.remembered
    }
}

#[test]
fn test_dirty_state_is_delegated_not_cached() {
    let unchanged = Rc::new(Cell::new(true));
    let tracker = ScriptedTracker {
        unchanged: Rc::clone(&unchanged),
        remembered: 0,
    };
    let mut ctx =
        MappingContext::new(common::social_metadata()).with_change_tracker(Box::new(tracker));
    let alice: EntityRef = person(1);
    ctx.register_node(alice.clone()).unwrap();

    assert!(!ctx.is_dirty(&alice));
    unchanged.set(false);
    assert!(ctx.is_dirty(&alice));
    unchanged.set(true);
    assert!(!ctx.is_dirty(&alice));
}
