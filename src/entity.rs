//! Hydrated domain objects tracked by a mapping context
//!
//! An [`Entity`] is the in-memory representative of a graph node or of a
//! relationship that carries its own identity. Entities are shared through
//! [`EntityRef`] handles; two handles are equal only when they point at the
//! same object, so a session can tell "the same node" apart from "another
//! object with the same id".

use crate::graph::{Label, PropertyMap, PropertyValue, TypeName};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A hydrated domain object
///
/// Entities have:
/// - A mapped type, resolved against the metadata registry
/// - An optional native id (unset until the backing store assigns one)
/// - Labels and properties
/// - Named references to other entities (start/end nodes of a relationship)
#[derive(Debug, Clone)]
pub struct Entity {
    type_name: TypeName,
    id: Option<i64>,
    labels: BTreeSet<Label>,
    properties: PropertyMap,
    references: HashMap<String, EntityRef>,
}

impl Entity {
    /// Create an entity of the given type with no id
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Entity {
            type_name: type_name.into(),
            id: None,
            labels: BTreeSet::new(),
            properties: PropertyMap::new(),
            references: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_reference(mut self, field: impl Into<String>, target: &EntityRef) -> Self {
        self.references.insert(field.into(), target.clone());
        self
    }

    /// Wrap this entity in a shared handle
    pub fn into_ref(self) -> EntityRef {
        EntityRef::new(self)
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    pub fn labels(&self) -> &BTreeSet<Label> {
        &self.labels
    }

    pub fn add_label(&mut self, label: impl Into<Label>) -> bool {
        self.labels.insert(label.into())
    }

    pub fn remove_label(&mut self, label: &Label) -> bool {
        self.labels.remove(label)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Set a property value, returning the previous one
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    pub fn references(&self) -> &HashMap<String, EntityRef> {
        &self.references
    }

    pub fn reference(&self, field: &str) -> Option<&EntityRef> {
        self.references.get(field)
    }

    pub fn set_reference(&mut self, field: impl Into<String>, target: Option<EntityRef>) {
        let field = field.into();
        match target {
            Some(target) => {
                self.references.insert(field, target);
            }
            None => {
                self.references.remove(&field);
            }
        }
    }
}

/// Shared handle to an [`Entity`]
///
/// Equality and hashing follow object identity, not field values. The handle
/// is single-threaded; a mapping context and the entities it tracks belong to
/// one session.
#[derive(Clone)]
pub struct EntityRef(Rc<RefCell<Entity>>);

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        EntityRef(Rc::new(RefCell::new(entity)))
    }

    /// Whether both handles point at the same object
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, Entity> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Entity> {
        self.0.borrow_mut()
    }

    pub fn id(&self) -> Option<i64> {
        self.0.borrow().id()
    }

    pub fn type_name(&self) -> TypeName {
        self.0.borrow().type_name().clone()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for EntityRef {
    // References are printed shallowly; relationship cycles would otherwise
    // recurse forever.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(entity) => write!(f, "EntityRef({}#{:?})", entity.type_name, entity.id),
            Err(_) => write!(f, "EntityRef(<borrowed>)"),
        }
    }
}

impl From<Entity> for EntityRef {
    fn from(entity: Entity) -> Self {
        EntityRef::new(entity)
    }
}
