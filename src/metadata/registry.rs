//! Explicit type registry
//!
//! Types are declared up front together with their direct supertypes. At
//! build time the registry validates the declarations and materializes, per
//! type, the transitive set of ancestors. Primary-index fields are inherited
//! from the nearest declaring ancestor.

use super::class_info::{ClassInfo, EntityKind, FieldInfo};
use super::MetadataProvider;
use crate::error::{OgmError, OgmResult};
use crate::graph::TypeName;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;

/// One type declaration fed to [`DomainMetadataBuilder`]
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    name: TypeName,
    kind: EntityKind,
    parents: Vec<TypeName>,
    primary_index: Option<String>,
    start_node: Option<String>,
    end_node: Option<String>,
}

impl TypeDeclaration {
    /// A node entity type
    pub fn node(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, EntityKind::Node)
    }

    /// A relationship entity type whose start and end nodes are held in the
    /// given reference fields
    pub fn relationship(
        name: impl Into<TypeName>,
        start_field: impl Into<String>,
        end_field: impl Into<String>,
    ) -> Self {
        let mut decl = Self::with_kind(name, EntityKind::Relationship);
        decl.start_node = Some(start_field.into());
        decl.end_node = Some(end_field.into());
        decl
    }

    /// An interface implemented by concrete types
    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self::with_kind(name, EntityKind::Interface)
    }

    fn with_kind(name: impl Into<TypeName>, kind: EntityKind) -> Self {
        TypeDeclaration {
            name: name.into(),
            kind,
            parents: Vec::new(),
            primary_index: None,
            start_node: None,
            end_node: None,
        }
    }

    /// Declare a direct supertype or implemented interface
    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Declare the property holding this type's primary-index value
    pub fn primary_index(mut self, field: impl Into<String>) -> Self {
        self.primary_index = Some(field.into());
        self
    }
}

/// Collects declarations and validates them into a [`DomainMetadata`]
#[derive(Debug, Default)]
pub struct DomainMetadataBuilder {
    declarations: Vec<TypeDeclaration>,
}

impl DomainMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, declaration: TypeDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn build(self) -> OgmResult<DomainMetadata> {
        let mut declared: IndexMap<TypeName, TypeDeclaration> = IndexMap::new();
        for decl in self.declarations {
            if declared.contains_key(&decl.name) {
                return Err(OgmError::InvalidMetadata(format!(
                    "type {} declared twice",
                    decl.name
                )));
            }
            declared.insert(decl.name.clone(), decl);
        }

        for decl in declared.values() {
            Self::validate(decl, &declared)?;
        }

        let mut classes = IndexMap::with_capacity(declared.len());
        for decl in declared.values() {
            let ancestors = Self::ancestors_of(decl, &declared)?;
            let primary_index = Self::primary_index_of(decl, &declared)
                .map(FieldInfo::property);
            classes.insert(
                decl.name.clone(),
                ClassInfo {
                    name: decl.name.clone(),
                    kind: decl.kind,
                    primary_index,
                    start_node: decl.start_node.clone().map(FieldInfo::reference),
                    end_node: decl.end_node.clone().map(FieldInfo::reference),
                    ancestors,
                },
            );
        }

        debug!("Built domain metadata with {} types", classes.len());
        Ok(DomainMetadata { classes })
    }

    fn validate(
        decl: &TypeDeclaration,
        declared: &IndexMap<TypeName, TypeDeclaration>,
    ) -> OgmResult<()> {
        for parent in &decl.parents {
            let parent_decl = declared.get(parent).ok_or_else(|| {
                OgmError::InvalidMetadata(format!(
                    "{} extends undeclared type {}",
                    decl.name, parent
                ))
            })?;
            let compatible = match (decl.kind, parent_decl.kind) {
                (_, EntityKind::Interface) => true,
                (EntityKind::Interface, _) => false,
                (child, parent) => child == parent,
            };
            if !compatible {
                return Err(OgmError::InvalidMetadata(format!(
                    "{} ({:?}) cannot extend {} ({:?})",
                    decl.name, decl.kind, parent, parent_decl.kind
                )));
            }
        }
        if decl.kind != EntityKind::Node && decl.primary_index.is_some() {
            return Err(OgmError::InvalidMetadata(format!(
                "primary index declared on non-node type {}",
                decl.name
            )));
        }
        Ok(())
    }

    // Depth-first walk over declared parents with an explicit stack; a type
    // reaching itself again is a cycle.
    fn ancestors_of(
        decl: &TypeDeclaration,
        declared: &IndexMap<TypeName, TypeDeclaration>,
    ) -> OgmResult<BTreeSet<TypeName>> {
        let mut ancestors = BTreeSet::new();
        let mut stack: Vec<&TypeName> = decl.parents.iter().collect();
        while let Some(name) = stack.pop() {
            if name == &decl.name {
                return Err(OgmError::InvalidMetadata(format!(
                    "inheritance cycle through {}",
                    decl.name
                )));
            }
            if !ancestors.insert(name.clone()) {
                continue;
            }
            if let Some(parent) = declared.get(name) {
                stack.extend(parent.parents.iter());
            }
        }
        Ok(ancestors)
    }

    // Breadth-first so the nearest ancestor wins.
    fn primary_index_of(
        decl: &TypeDeclaration,
        declared: &IndexMap<TypeName, TypeDeclaration>,
    ) -> Option<String> {
        if decl.kind != EntityKind::Node {
            return None;
        }
        let mut queue = std::collections::VecDeque::from([decl]);
        let mut seen = BTreeSet::new();
        while let Some(current) = queue.pop_front() {
            if let Some(field) = &current.primary_index {
                return Some(field.clone());
            }
            for parent in &current.parents {
                if seen.insert(parent) {
                    if let Some(p) = declared.get(parent) {
                        queue.push_back(p);
                    }
                }
            }
        }
        None
    }
}

/// Registry of every mapped type in a domain
#[derive(Debug, Clone)]
pub struct DomainMetadata {
    classes: IndexMap<TypeName, ClassInfo>,
}

impl DomainMetadata {
    pub fn builder() -> DomainMetadataBuilder {
        DomainMetadataBuilder::new()
    }

    /// Number of declared types
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.classes.contains_key(type_name)
    }
}

impl MetadataProvider for DomainMetadata {
    fn class_info(&self, type_name: &TypeName) -> OgmResult<&ClassInfo> {
        self.classes
            .get(type_name)
            .ok_or_else(|| OgmError::UnknownType(type_name.clone()))
    }

    fn implementing_types(&self, type_name: &TypeName) -> OgmResult<Vec<TypeName>> {
        self.class_info(type_name)?;
        Ok(self
            .classes
            .values()
            .filter(|info| !info.is_interface() && info.ancestors.contains(type_name))
            .map(|info| info.name.clone())
            .collect())
    }

    /// Interfaces count as relationship types when every implementor is one
    fn is_relationship_type(&self, type_name: &TypeName) -> OgmResult<bool> {
        let info = self.class_info(type_name)?;
        if !info.is_interface() {
            return Ok(info.is_relationship());
        }
        let mut implementors = self
            .classes
            .values()
            .filter(|c| !c.is_interface() && c.ancestors.contains(type_name))
            .peekable();
        if implementors.peek().is_none() {
            return Ok(false);
        }
        Ok(implementors.all(|c| c.is_relationship()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn social_domain() -> DomainMetadata {
        DomainMetadata::builder()
            .declare(TypeDeclaration::interface("Named"))
            .declare(TypeDeclaration::interface("Timestamped"))
            .declare(TypeDeclaration::node("Person").extends("Named").primary_index("email"))
            .declare(TypeDeclaration::node("Employee").extends("Person"))
            .declare(TypeDeclaration::node("Company").extends("Named"))
            .declare(
                TypeDeclaration::relationship("WorksAt", "employee", "company")
                    .extends("Timestamped"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_transitive_ancestors() {
        let meta = social_domain();
        let employee = meta.class_info(&"Employee".into()).unwrap();

        assert!(employee.ancestors().contains(&TypeName::new("Person")));
        assert!(employee.ancestors().contains(&TypeName::new("Named")));
        assert!(meta.is_assignable(&"Employee".into(), &"Named".into()).unwrap());
        assert!(!meta.is_assignable(&"Company".into(), &"Person".into()).unwrap());
    }

    #[test]
    fn test_primary_index_is_inherited() {
        let meta = social_domain();
        let field = meta.primary_index_field(&"Employee".into()).unwrap().unwrap();
        assert_eq!(field.name(), "email");
        assert!(meta.primary_index_field(&"Company".into()).unwrap().is_none());
    }

    #[test]
    fn test_implementing_types() {
        let meta = social_domain();
        let named = meta.implementing_types(&"Named".into()).unwrap();
        assert_eq!(
            named,
            vec![TypeName::new("Person"), TypeName::new("Employee"), TypeName::new("Company")]
        );
        assert!(meta.is_interface(&"Named".into()).unwrap());
    }

    #[test]
    fn test_relationship_accessors() {
        let meta = social_domain();
        let works_at = TypeName::new("WorksAt");

        assert!(meta.is_relationship_type(&works_at).unwrap());
        assert_eq!(meta.start_node_accessor(&works_at).unwrap().name(), "employee");
        assert_eq!(meta.end_node_accessor(&works_at).unwrap().name(), "company");
        assert!(matches!(
            meta.start_node_accessor(&"Person".into()),
            Err(OgmError::NotARelationshipType(_))
        ));
    }

    #[test]
    fn test_interface_relationship_typing() {
        let meta = social_domain();
        assert!(meta.is_relationship_type(&"Timestamped".into()).unwrap());
        assert!(!meta.is_relationship_type(&"Named".into()).unwrap());
    }

    #[test]
    fn test_unknown_type() {
        let meta = social_domain();
        let err = meta.class_info(&"Robot".into()).unwrap_err();
        assert!(matches!(err, OgmError::UnknownType(ref t) if t.as_str() == "Robot"));
    }

    #[test]
    fn test_invalid_declarations() {
        let undeclared = DomainMetadata::builder()
            .declare(TypeDeclaration::node("Person").extends("Ghost"))
            .build();
        assert!(matches!(undeclared, Err(OgmError::InvalidMetadata(_))));

        let duplicate = DomainMetadata::builder()
            .declare(TypeDeclaration::node("Person"))
            .declare(TypeDeclaration::node("Person"))
            .build();
        assert!(matches!(duplicate, Err(OgmError::InvalidMetadata(_))));

        let node_from_rel = DomainMetadata::builder()
            .declare(TypeDeclaration::relationship("Knows", "a", "b"))
            .declare(TypeDeclaration::node("Person").extends("Knows"))
            .build();
        assert!(matches!(node_from_rel, Err(OgmError::InvalidMetadata(_))));

        let indexed_rel = DomainMetadata::builder()
            .declare(TypeDeclaration::relationship("Knows", "a", "b").primary_index("uuid"))
            .build();
        assert!(matches!(indexed_rel, Err(OgmError::InvalidMetadata(_))));
    }

    #[test]
    fn test_inheritance_cycle() {
        let cyclic = DomainMetadata::builder()
            .declare(TypeDeclaration::interface("A").extends("B"))
            .declare(TypeDeclaration::interface("B").extends("A"))
            .build();
        assert!(matches!(cyclic, Err(OgmError::InvalidMetadata(_))));
    }
}
