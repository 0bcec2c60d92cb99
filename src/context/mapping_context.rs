//! Session-scoped identity map
//!
//! Registers kept by a [`MappingContext`]:
//! - nodes: native id -> node entity
//! - primary_index: primary-index value -> (type -> node entity)
//! - relationship_entities: native id -> relationship entity
//! - relationships: set of [`RelationshipRecord`]
//!
//! Every register is first-write-wins. Removing an entity purges everything
//! whose validity depends on it; see [`MappingContext::remove_entity`].

use super::relationship::RelationshipRecord;
use crate::config::ContextConfig;
use crate::entity::EntityRef;
use crate::error::OgmResult;
use crate::graph::{IndexValue, PropertyValue, TypeName};
use crate::metadata::MetadataProvider;
use crate::tracking::{ChangeTracker, IdentityMap, LabelHistory};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Set of relationship records tracked by a context
pub type RelationshipSet = FxHashSet<RelationshipRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Register {
    Node,
    Relationship,
}

/// Identity map and relationship bookkeeping for one session
///
/// A context is owned by exactly one session at a time and performs no
/// internal synchronization.
pub struct MappingContext {
    metadata: Arc<dyn MetadataProvider>,
    tracker: Box<dyn ChangeTracker>,
    config: ContextConfig,

    /// native id -> node entity
    nodes: FxHashMap<i64, EntityRef>,

    /// primary-index value -> runtime type -> node entity
    primary_index: FxHashMap<IndexValue, IndexMap<TypeName, EntityRef>>,

    /// node id -> the primary-index key it was registered under
    indexed_keys: FxHashMap<i64, (IndexValue, TypeName)>,

    /// native id -> relationship entity
    relationship_entities: FxHashMap<i64, EntityRef>,

    relationships: RelationshipSet,
}

impl MappingContext {
    /// Create a context with default configuration and an [`IdentityMap`]
    /// change tracker
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self::build(metadata, ContextConfig::default())
    }

    /// Create a context with custom configuration
    pub fn with_config(
        metadata: Arc<dyn MetadataProvider>,
        config: ContextConfig,
    ) -> OgmResult<Self> {
        config.validate()?;
        Ok(Self::build(metadata, config))
    }

    /// Replace the change tracker. Intended for construction time; snapshots
    /// held by the previous tracker are dropped.
    pub fn with_change_tracker(mut self, tracker: Box<dyn ChangeTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    fn build(metadata: Arc<dyn MetadataProvider>, config: ContextConfig) -> Self {
        let node_capacity = config.node_capacity;
        let relationship_capacity = config.relationship_capacity;
        MappingContext {
            metadata,
            tracker: Box::new(IdentityMap::new()),
            config,
            nodes: FxHashMap::with_capacity_and_hasher(node_capacity, Default::default()),
            primary_index: FxHashMap::default(),
            indexed_keys: FxHashMap::default(),
            relationship_entities: FxHashMap::with_capacity_and_hasher(
                relationship_capacity,
                Default::default(),
            ),
            relationships: FxHashSet::with_capacity_and_hasher(
                relationship_capacity,
                Default::default(),
            ),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataProvider> {
        &self.metadata
    }

    // ---- node entities -------------------------------------------------

    /// Get a node entity by native id or, failing that, by primary-index value
    ///
    /// An integer key is tried as a native id first. Any key then falls back to
    /// the primary-index register, where the earliest-registered type wins if
    /// several types share the value.
    pub fn lookup_node(&self, key: impl Into<IndexValue>) -> Option<EntityRef> {
        let key = key.into();
        if let Some(id) = key.as_native_id() {
            if let Some(entity) = self.nodes.get(&id) {
                return Some(entity.clone());
            }
        }
        self.primary_index
            .get(&key)
            .and_then(|by_type| by_type.values().next())
            .cloned()
    }

    /// Get a node entity by primary-index value, restricted to `type_name`
    /// and its subtypes
    pub fn lookup_node_by_key(
        &self,
        type_name: &TypeName,
        key: impl Into<IndexValue>,
    ) -> OgmResult<Option<EntityRef>> {
        let Some(by_type) = self.primary_index.get(&key.into()) else {
            return Ok(None);
        };
        for (runtime, entity) in by_type {
            if self.metadata.is_assignable(runtime, type_name)? {
                return Ok(Some(entity.clone()));
            }
        }
        Ok(None)
    }

    /// Register a node entity
    ///
    /// The first entity registered for an id wins; registering another entity
    /// with the same id is a no-op. Either way the argument itself is returned,
    /// which is not necessarily the tracked instance. Use [`lookup_node`] to get
    /// the canonical one. Entities without an id are not tracked.
    ///
    /// [`lookup_node`]: MappingContext::lookup_node
    pub fn register_node(&mut self, entity: EntityRef) -> OgmResult<EntityRef> {
        let (type_name, id) = self.identify(&entity);
        let Some(id) = id else {
            trace!("Ignoring {} without an id", type_name);
            return Ok(entity);
        };
        if self.nodes.contains_key(&id) {
            trace!("Node {} already registered", id);
            return Ok(entity);
        }

        // Resolve the key before touching any register so a strict-mode
        // failure leaves the context unchanged.
        let key = self.primary_key_of(&entity, &type_name, self.config.strict_primary_index)?;

        self.nodes.insert(id, entity.clone());
        self.tracker.remember(&entity.borrow());

        if let Some(key) = key {
            let by_type = self.primary_index.entry(key.clone()).or_default();
            if !by_type.contains_key(&type_name) {
                by_type.insert(type_name.clone(), entity.clone());
                self.indexed_keys.insert(id, (key, type_name.clone()));
            }
        }

        debug!("Registered {} node {}", type_name, id);
        Ok(entity)
    }

    /// Remove a node entity from the node registers
    ///
    /// With `deregister_dependents`, relationship entities that start or end
    /// at this node are dropped from the relationship-entity register as well,
    /// together with the records naming them. Other relationship records are
    /// left alone; use [`remove_entity`] for a full purge.
    ///
    /// [`remove_entity`]: MappingContext::remove_entity
    pub fn remove_node_entity(
        &mut self,
        entity: &EntityRef,
        deregister_dependents: bool,
    ) -> OgmResult<()> {
        let (_, id) = self.identify(entity);
        if let Some(id) = id {
            self.nodes.remove(&id);
            if let Some((key, type_name)) = self.indexed_keys.remove(&id) {
                if let Some(by_type) = self.primary_index.get_mut(&key) {
                    by_type.shift_remove(&type_name);
                    if by_type.is_empty() {
                        self.primary_index.remove(&key);
                    }
                }
            }
        }

        if deregister_dependents {
            self.deregister_dependent_relationship_entities(entity, id)?;
        }
        Ok(())
    }

    /// Remove and re-register a node entity, taking a fresh snapshot
    ///
    /// Dependent relationship entities stay registered.
    pub fn replace_node(&mut self, entity: EntityRef) -> OgmResult<EntityRef> {
        self.remove_node_entity(&entity, false)?;
        self.register_node(entity)
    }

    // ---- relationship entities -----------------------------------------

    pub fn lookup_relationship_entity(&self, id: i64) -> Option<EntityRef> {
        self.relationship_entities.get(&id).cloned()
    }

    /// Register a relationship entity under `id`
    ///
    /// Always returns the tracked instance: if `id` is already registered the
    /// supplied entity is discarded and the existing one returned.
    ///
    /// The entity is expected to carry `id` as its own identity. The change
    /// tracker snapshots it under that identity, so an entity without it reads
    /// as dirty straight after registration.
    pub fn register_relationship_entity(&mut self, entity: EntityRef, id: i64) -> EntityRef {
        match self.relationship_entities.entry(id) {
            Entry::Occupied(existing) => {
                trace!("Relationship entity {} already registered", id);
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let own_id = self.metadata.entity_id(&entity.borrow());
                if own_id != Some(id) {
                    warn!(
                        "Relationship entity registered under {} carries id {:?}",
                        id, own_id
                    );
                }
                slot.insert(entity.clone());
                self.tracker.remember(&entity.borrow());
                debug!("Registered relationship entity {}", id);
                entity
            }
        }
    }

    /// Drop whatever is registered under `id`, then register `entity`
    ///
    /// Relationship records naming `id` stay tracked and now refer to
    /// `entity`.
    pub fn replace_relationship_entity(&mut self, entity: EntityRef, id: i64) -> EntityRef {
        self.relationship_entities.remove(&id);
        self.register_relationship_entity(entity, id)
    }

    // ---- relationship records ------------------------------------------

    /// Track a relationship record
    ///
    /// A relationship id that does not name a tracked relationship entity is
    /// cleared, leaving a structural record. Returns whether the record was
    /// not already tracked.
    pub fn add_relationship(&mut self, record: RelationshipRecord) -> bool {
        let record = match record.relationship_id() {
            Some(rel_id) if !self.relationship_entities.contains_key(&rel_id) => {
                trace!(
                    "Relationship {} is not a tracked entity; keeping {} structurally",
                    rel_id, record
                );
                record.without_relationship_id()
            }
            _ => record,
        };
        self.relationships.insert(record)
    }

    pub fn contains_relationship(&self, record: &RelationshipRecord) -> bool {
        self.relationships.contains(record)
    }

    /// Stop tracking a relationship record; returns whether it was tracked
    pub fn remove_relationship(&mut self, record: &RelationshipRecord) -> bool {
        self.relationships.remove(record)
    }

    /// All tracked relationship records, in no particular order
    pub fn all_relationships(&self) -> &RelationshipSet {
        &self.relationships
    }

    // ---- dirty checking ------------------------------------------------

    /// Whether the entity changed since it was registered. Entities that were
    /// never registered are dirty.
    pub fn is_dirty(&self, entity: &EntityRef) -> bool {
        !self.tracker.remembered(&entity.borrow())
    }

    /// Labels at registration time alongside the entity's current labels
    pub fn label_history(&self, entity: &EntityRef) -> LabelHistory {
        self.tracker.label_history(&entity.borrow())
    }

    // ---- removal -------------------------------------------------------

    /// Purge an entity and everything that depends on it
    ///
    /// Removing a node drops every relationship record touching it and queues
    /// the relationship entities those records referenced. Removing a
    /// relationship entity drops the records naming it and queues both of its
    /// endpoint nodes. The queue is
    /// drained until nothing new is reachable, so a whole connected component
    /// of tracked relationship entities is detached in one call.
    ///
    /// A metadata error aborts the purge; removals performed before it stay
    /// performed.
    pub fn remove_entity(&mut self, entity: &EntityRef) -> OgmResult<()> {
        self.purge(entity.clone())
    }

    /// Purge every tracked entity of `type_name` or any of its subtypes. For
    /// an interface, every implementing type is purged.
    pub fn remove_type(&mut self, type_name: &TypeName) -> OgmResult<()> {
        if self.metadata.is_interface(type_name)? {
            for implementing in self.metadata.implementing_types(type_name)? {
                self.remove_type(&implementing)?;
            }
            return Ok(());
        }
        let entities = self.all_entities_of(type_name)?;
        debug!("Purging {} tracked entities of type {}", entities.len(), type_name);
        for entity in entities {
            self.purge(entity)?;
        }
        Ok(())
    }

    /// Purge an entity and unset its id
    ///
    /// For entities whose id was assigned inside a transaction that was later
    /// rolled back.
    pub fn reset(&mut self, entity: &EntityRef) -> OgmResult<()> {
        self.remove_entity(entity)?;
        self.metadata.set_identity_id(&mut entity.borrow_mut(), None);
        Ok(())
    }

    /// Purge the node entity found by [`lookup_node`]; returns whether one was
    /// found
    ///
    /// [`lookup_node`]: MappingContext::lookup_node
    pub fn detach_node(&mut self, key: impl Into<IndexValue>) -> OgmResult<bool> {
        match self.lookup_node(key) {
            Some(entity) => {
                self.purge(entity)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Purge the relationship entity registered under `id`; returns whether
    /// one was found
    pub fn detach_relationship(&mut self, id: i64) -> OgmResult<bool> {
        match self.lookup_relationship_entity(id) {
            Some(entity) => {
                self.purge(entity)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forget everything: all registers and every remembered snapshot
    pub fn clear(&mut self) {
        self.tracker.clear();
        self.relationships.clear();
        self.nodes.clear();
        self.primary_index.clear();
        self.indexed_keys.clear();
        self.relationship_entities.clear();
        debug!("Mapping context cleared");
    }

    // ---- queries -------------------------------------------------------

    /// Objects one hop away from `entity`, as far as this session knows
    ///
    /// For a tracked node: the opposite endpoint of every relationship record
    /// touching it, when that endpoint is tracked. For a tracked relationship
    /// entity: its start and end nodes. Anything else has no neighbours.
    pub fn neighbours(&self, entity: &EntityRef) -> OgmResult<FxHashSet<EntityRef>> {
        let mut neighbours = FxHashSet::default();
        let (type_name, id) = self.identify(entity);
        let Some(id) = id else {
            return Ok(neighbours);
        };

        if !self.metadata.is_relationship_type(&type_name)? {
            if self.nodes.contains_key(&id) {
                // Linear in the number of tracked relationships.
                for record in &self.relationships {
                    let affected = record.other_end(id).and_then(|other| self.nodes.get(&other));
                    if let Some(affected) = affected {
                        neighbours.insert(affected.clone());
                    }
                }
            }
        } else if self.relationship_entities.contains_key(&id) {
            let (start, end) = self.endpoints(entity, &type_name)?;
            neighbours.extend(start);
            neighbours.extend(end);
        }
        Ok(neighbours)
    }

    /// Tracked entities whose runtime type is `type_name` or one of its
    /// subtypes, ordered by id
    ///
    /// Relationship types are looked up among relationship entities, all
    /// other types among nodes.
    pub fn all_entities_of(&self, type_name: &TypeName) -> OgmResult<Vec<EntityRef>> {
        let register = if self.metadata.is_relationship_type(type_name)? {
            &self.relationship_entities
        } else {
            &self.nodes
        };

        let mut result = Vec::new();
        for entity in register.values() {
            let runtime = self.metadata.type_of(&entity.borrow());
            if self.metadata.is_assignable(&runtime, type_name)? {
                result.push(entity.clone());
            }
        }
        result.sort_by_key(|entity| entity.id());
        Ok(result)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_entity_count(&self) -> usize {
        self.relationship_entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.primary_index.is_empty()
            && self.relationship_entities.is_empty()
            && self.relationships.is_empty()
    }

    // ---- internals -----------------------------------------------------

    fn identify(&self, entity: &EntityRef) -> (TypeName, Option<i64>) {
        let entity = entity.borrow();
        (self.metadata.type_of(&entity), self.metadata.entity_id(&entity))
    }

    fn endpoints(
        &self,
        entity: &EntityRef,
        type_name: &TypeName,
    ) -> OgmResult<(Option<EntityRef>, Option<EntityRef>)> {
        let start_reader = self.metadata.start_node_accessor(type_name)?;
        let end_reader = self.metadata.end_node_accessor(type_name)?;
        let entity = entity.borrow();
        Ok((start_reader.read_reference(&entity), end_reader.read_reference(&entity)))
    }

    fn primary_key_of(
        &self,
        entity: &EntityRef,
        type_name: &TypeName,
        strict: bool,
    ) -> OgmResult<Option<IndexValue>> {
        let Some(field) = self.metadata.primary_index_field(type_name)? else {
            return Ok(None);
        };
        let value = field.read(&entity.borrow());
        match value {
            None | Some(PropertyValue::Null) => Ok(None),
            Some(value) => match IndexValue::try_from(&value) {
                Ok(key) => Ok(Some(key)),
                Err(err) if strict => Err(err),
                Err(_) => {
                    warn!(
                        "Primary index {}.{} holds an unindexable {}; tracking by id only",
                        type_name,
                        field.name(),
                        value.type_name()
                    );
                    Ok(None)
                }
            },
        }
    }

    fn deregister_dependent_relationship_entities(
        &mut self,
        node: &EntityRef,
        node_id: Option<i64>,
    ) -> OgmResult<()> {
        let is_endpoint = |endpoint: Option<EntityRef>| {
            endpoint.is_some_and(|e| e.ptr_eq(node) || (node_id.is_some() && e.id() == node_id))
        };

        let mut dependents = Vec::new();
        for (rel_id, relationship) in &self.relationship_entities {
            let type_name = self.metadata.type_of(&relationship.borrow());
            let (start, end) = self.endpoints(relationship, &type_name)?;
            if is_endpoint(start) || is_endpoint(end) {
                dependents.push(*rel_id);
            }
        }
        for rel_id in dependents {
            trace!("Deregistering dependent relationship entity {}", rel_id);
            self.forget_relationship_entity(rel_id);
        }
        Ok(())
    }

    /// Drop a relationship entity along with every record that names it
    fn forget_relationship_entity(&mut self, id: i64) -> Option<EntityRef> {
        let removed = self.relationship_entities.remove(&id)?;
        self.relationships.retain(|record| record.relationship_id() != Some(id));
        Some(removed)
    }

    fn purge(&mut self, root: EntityRef) -> OgmResult<()> {
        let mut pending = VecDeque::from([root]);
        let mut visited: FxHashSet<(Register, i64)> = FxHashSet::default();
        let mut purged = 0usize;

        while let Some(entity) = pending.pop_front() {
            let (type_name, id) = self.identify(&entity);
            let Some(id) = id else {
                continue;
            };

            if self.metadata.is_relationship_type(&type_name)? {
                if !visited.insert((Register::Relationship, id)) {
                    continue;
                }
                if self.forget_relationship_entity(id).is_none() {
                    continue;
                }
                purged += 1;
                let (start, end) = self.endpoints(&entity, &type_name)?;
                pending.extend(start);
                pending.extend(end);
            } else {
                if !visited.insert((Register::Node, id)) {
                    continue;
                }
                if !self.nodes.contains_key(&id) {
                    continue;
                }
                self.remove_node_entity(&entity, false)?;
                purged += 1;

                let relationship_entities = &self.relationship_entities;
                let mut dependents = Vec::new();
                self.relationships.retain(|record| {
                    if !record.touches(id) {
                        return true;
                    }
                    if let Some(relationship) = record
                        .relationship_id()
                        .and_then(|rel_id| relationship_entities.get(&rel_id))
                    {
                        dependents.push(relationship.clone());
                    }
                    false
                });
                pending.extend(dependents);
            }
        }

        debug!("Purged {} entities", purged);
        Ok(())
    }
}

impl fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingContext")
            .field("nodes", &self.nodes.len())
            .field("primary_index", &self.primary_index.len())
            .field("relationship_entities", &self.relationship_entities.len())
            .field("relationships", &self.relationships.len())
            .field("snapshots", &self.tracker.len())
            .finish()
    }
}
