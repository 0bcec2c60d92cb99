//! Type descriptions and field accessors

use crate::entity::{Entity, EntityRef};
use crate::graph::{PropertyValue, TypeName};
use std::collections::BTreeSet;

/// What a mapped type stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A concrete type whose instances are graph nodes
    Node,
    /// A concrete type whose instances are relationships with their own identity
    Relationship,
    /// A capability implemented by concrete types; never instantiated
    Interface,
}

/// How a field is stored on an [`Entity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Property,
    Reference,
}

/// Accessor for one field of a mapped type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    name: String,
    kind: FieldKind,
}

impl FieldInfo {
    pub fn property(name: impl Into<String>) -> Self {
        FieldInfo {
            name: name.into(),
            kind: FieldKind::Property,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        FieldInfo {
            name: name.into(),
            kind: FieldKind::Reference,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Read a property field. Reference fields read as `None`.
    pub fn read(&self, entity: &Entity) -> Option<PropertyValue> {
        match self.kind {
            FieldKind::Property => entity.get_property(&self.name).cloned(),
            FieldKind::Reference => None,
        }
    }

    /// Read a reference field. Property fields read as `None`.
    pub fn read_reference(&self, entity: &Entity) -> Option<EntityRef> {
        match self.kind {
            FieldKind::Reference => entity.reference(&self.name).cloned(),
            FieldKind::Property => None,
        }
    }
}

/// Description of one mapped type
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub(crate) name: TypeName,
    pub(crate) kind: EntityKind,
    pub(crate) primary_index: Option<FieldInfo>,
    pub(crate) start_node: Option<FieldInfo>,
    pub(crate) end_node: Option<FieldInfo>,
    /// Every supertype and interface, transitively; excludes the type itself
    pub(crate) ancestors: BTreeSet<TypeName>,
}

impl ClassInfo {
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == EntityKind::Interface
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == EntityKind::Relationship
    }

    pub fn primary_index_field(&self) -> Option<&FieldInfo> {
        self.primary_index.as_ref()
    }

    pub fn start_node_reader(&self) -> Option<&FieldInfo> {
        self.start_node.as_ref()
    }

    pub fn end_node_reader(&self) -> Option<&FieldInfo> {
        self.end_node.as_ref()
    }

    pub fn ancestors(&self) -> &BTreeSet<TypeName> {
        &self.ancestors
    }

    /// Whether an instance of this type may be used where `target` is expected
    pub fn is_assignable_to(&self, target: &TypeName) -> bool {
        &self.name == target || self.ancestors.contains(target)
    }
}
