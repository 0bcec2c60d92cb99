//! Entity type metadata
//!
//! A mapping context never inspects domain objects on its own; it asks a
//! [`MetadataProvider`] which type an entity has, where its identity lives,
//! which field is its primary index and, for relationship entities, how to
//! reach the start and end nodes.
//!
//! [`DomainMetadata`] is the registry shipped with this crate. Each type is
//! declared once with its supertypes and interfaces, so polymorphic queries
//! reduce to set-membership tests.

pub mod class_info;
pub mod registry;

pub use class_info::{ClassInfo, EntityKind, FieldInfo, FieldKind};
pub use registry::{DomainMetadata, DomainMetadataBuilder, TypeDeclaration};

use crate::entity::Entity;
use crate::error::{OgmError, OgmResult};
use crate::graph::TypeName;

/// Resolves runtime entities to their type descriptions and field accessors
pub trait MetadataProvider {
    /// Description of a type. Unknown types are a configuration defect.
    fn class_info(&self, type_name: &TypeName) -> OgmResult<&ClassInfo>;

    /// Concrete types that implement or extend `type_name`
    fn implementing_types(&self, type_name: &TypeName) -> OgmResult<Vec<TypeName>>;

    /// Whether instances of `type_name` live in the relationship-entity register
    fn is_relationship_type(&self, type_name: &TypeName) -> OgmResult<bool> {
        Ok(self.class_info(type_name)?.is_relationship())
    }

    fn type_of(&self, entity: &Entity) -> TypeName {
        entity.type_name().clone()
    }

    fn primary_index_field(&self, type_name: &TypeName) -> OgmResult<Option<&FieldInfo>> {
        Ok(self.class_info(type_name)?.primary_index_field())
    }

    fn start_node_accessor(&self, type_name: &TypeName) -> OgmResult<&FieldInfo> {
        self.class_info(type_name)?
            .start_node_reader()
            .ok_or_else(|| OgmError::NotARelationshipType(type_name.clone()))
    }

    fn end_node_accessor(&self, type_name: &TypeName) -> OgmResult<&FieldInfo> {
        self.class_info(type_name)?
            .end_node_reader()
            .ok_or_else(|| OgmError::NotARelationshipType(type_name.clone()))
    }

    fn is_interface(&self, type_name: &TypeName) -> OgmResult<bool> {
        Ok(self.class_info(type_name)?.is_interface())
    }

    /// Whether an instance of `runtime` may be used where `target` is expected
    fn is_assignable(&self, runtime: &TypeName, target: &TypeName) -> OgmResult<bool> {
        Ok(self.class_info(runtime)?.is_assignable_to(target))
    }

    fn entity_id(&self, entity: &Entity) -> Option<i64> {
        entity.id()
    }

    fn set_identity_id(&self, entity: &mut Entity, id: Option<i64>) {
        entity.set_id(id);
    }
}
