//! Samyama OGM mapping context
//!
//! Session-scoped bookkeeping for an object-graph mapping layer on top of the
//! Samyama property graph.
//!
//! # Architecture
//!
//! - [`graph`]: labels, relationship types, type names, property values
//! - [`entity`]: hydrated domain objects and shared handles to them
//! - [`metadata`]: the type registry that describes mapped types
//! - [`tracking`]: snapshot-based dirty checking
//! - [`context`]: the identity map, relationship records and cascading purge
//!
//! The context is pure in-memory bookkeeping. It does not decide when to
//! flush, does not generate queries and does not enforce schema constraints.
//!
//! ## Example Usage
//!
//! ```rust
//! use samyama_ogm::{DomainMetadata, Entity, MappingContext, RelationshipRecord, TypeDeclaration};
//! use std::sync::Arc;
//!
//! let metadata = DomainMetadata::builder()
//!     .declare(TypeDeclaration::node("Person").primary_index("email"))
//!     .declare(TypeDeclaration::relationship("Knows", "start", "end"))
//!     .build()
//!     .unwrap();
//! let mut context = MappingContext::new(Arc::new(metadata));
//!
//! let alice = Entity::new("Person")
//!     .with_id(1)
//!     .with_property("email", "alice@example.com")
//!     .into_ref();
//! let bob = Entity::new("Person").with_id(2).into_ref();
//! context.register_node(alice.clone()).unwrap();
//! context.register_node(bob.clone()).unwrap();
//!
//! let knows = Entity::new("Knows")
//!     .with_id(10)
//!     .with_reference("start", &alice)
//!     .with_reference("end", &bob)
//!     .into_ref();
//! context.register_relationship_entity(knows, 10);
//! context.add_relationship(RelationshipRecord::new(1, 2, "KNOWS", Some(10)));
//!
//! assert!(context.lookup_node("alice@example.com").unwrap().ptr_eq(&alice));
//! assert!(context.neighbours(&alice).unwrap().contains(&bob));
//!
//! // Removing Alice cascades through the relationship entity to Bob.
//! context.remove_entity(&alice).unwrap();
//! assert!(context.is_empty());
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod tracking;

// Re-export main types for convenience
pub use config::ContextConfig;
pub use context::{MappingContext, RelationshipRecord, RelationshipSet};
pub use entity::{Entity, EntityRef};
pub use error::{OgmError, OgmResult};
pub use graph::{EdgeType, IndexValue, Label, PropertyMap, PropertyValue, TypeName};
pub use metadata::{
    ClassInfo, DomainMetadata, DomainMetadataBuilder, EntityKind, FieldInfo, FieldKind,
    MetadataProvider, TypeDeclaration,
};
pub use tracking::{ChangeTracker, IdentityMap, LabelHistory};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
