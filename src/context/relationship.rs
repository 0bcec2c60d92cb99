//! Structural relationship facts known to a session

use crate::graph::EdgeType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// "A relationship of this type connects these two node ids", optionally
/// backed by a tracked relationship entity.
///
/// Records are compared by value over all four fields. A record without a
/// relationship id is known structurally only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipRecord {
    start_node_id: i64,
    end_node_id: i64,
    relationship_type: EdgeType,
    relationship_id: Option<i64>,
}

impl RelationshipRecord {
    pub fn new(
        start_node_id: i64,
        end_node_id: i64,
        relationship_type: impl Into<EdgeType>,
        relationship_id: Option<i64>,
    ) -> Self {
        RelationshipRecord {
            start_node_id,
            end_node_id,
            relationship_type: relationship_type.into(),
            relationship_id,
        }
    }

    /// A record not backed by any relationship entity
    pub fn structural(
        start_node_id: i64,
        end_node_id: i64,
        relationship_type: impl Into<EdgeType>,
    ) -> Self {
        Self::new(start_node_id, end_node_id, relationship_type, None)
    }

    pub fn start_node_id(&self) -> i64 {
        self.start_node_id
    }

    pub fn end_node_id(&self) -> i64 {
        self.end_node_id
    }

    pub fn relationship_type(&self) -> &EdgeType {
        &self.relationship_type
    }

    pub fn relationship_id(&self) -> Option<i64> {
        self.relationship_id
    }

    /// Whether either endpoint is `node_id`
    pub fn touches(&self, node_id: i64) -> bool {
        self.start_node_id == node_id || self.end_node_id == node_id
    }

    /// The endpoint opposite `node_id`, if the record touches it. A self-loop
    /// yields the node itself.
    pub fn other_end(&self, node_id: i64) -> Option<i64> {
        if self.end_node_id == node_id {
            Some(self.start_node_id)
        } else if self.start_node_id == node_id {
            Some(self.end_node_id)
        } else {
            None
        }
    }

    pub(crate) fn without_relationship_id(mut self) -> Self {
        self.relationship_id = None;
        self
    }
}

impl fmt::Display for RelationshipRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[:{}", self.start_node_id, self.relationship_type)?;
        if let Some(id) = self.relationship_id {
            write!(f, " #{}", id)?;
        }
        write!(f, "]->({})", self.end_node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_equality() {
        let a = RelationshipRecord::new(1, 2, "KNOWS", Some(10));
        let b = RelationshipRecord::new(1, 2, "KNOWS", Some(10));
        let c = RelationshipRecord::new(1, 2, "KNOWS", None);
        let d = RelationshipRecord::new(2, 1, "KNOWS", Some(10));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);

        let set: HashSet<_> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_endpoints() {
        let rel = RelationshipRecord::structural(1, 2, "KNOWS");

        assert!(rel.touches(1));
        assert!(rel.touches(2));
        assert!(!rel.touches(3));
        assert_eq!(rel.other_end(1), Some(2));
        assert_eq!(rel.other_end(2), Some(1));
        assert_eq!(rel.other_end(3), None);
    }

    #[test]
    fn test_self_loop() {
        let rel = RelationshipRecord::structural(5, 5, "MANAGES");
        assert_eq!(rel.other_end(5), Some(5));
    }

    #[test]
    fn test_degrade_to_structural() {
        let rel = RelationshipRecord::new(1, 2, "KNOWS", Some(10)).without_relationship_id();
        assert_eq!(rel.relationship_id(), None);
        assert_eq!(rel.relationship_type().as_str(), "KNOWS");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            RelationshipRecord::new(1, 2, "KNOWS", Some(10)).to_string(),
            "(1)-[:KNOWS #10]->(2)"
        );
        assert_eq!(RelationshipRecord::structural(3, 4, "LIKES").to_string(), "(3)-[:LIKES]->(4)");
    }
}
