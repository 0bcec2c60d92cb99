//! Per-session mapping context
//!
//! The [`MappingContext`] keeps exactly one in-memory representative per
//! graph node or relationship entity seen during a session, tracks which
//! relationships between nodes are currently known, and purges dependent
//! state when entities go away.

pub mod mapping_context;
pub mod relationship;

pub use mapping_context::{MappingContext, RelationshipSet};
pub use relationship::RelationshipRecord;
