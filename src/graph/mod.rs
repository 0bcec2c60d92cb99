//! Graph value types
//!
//! Labels, relationship types, type names and property values shared by
//! entities, metadata and the mapping context.

pub mod property;
pub mod types;

// Re-export main types
pub use property::{IndexValue, PropertyMap, PropertyValue};
pub use types::{EdgeType, Label, TypeName};
