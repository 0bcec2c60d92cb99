//! Snapshot-digest change tracker
//!
//! Snapshots are keyed by (type, native id). Each one keeps a SHA-256 digest
//! of the entity's labels, properties and outgoing references, plus the label
//! set itself for label history.

use super::{ChangeTracker, LabelHistory};
use crate::entity::Entity;
use crate::graph::{Label, PropertyValue, TypeName};
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::trace;

#[derive(Debug, Clone)]
struct Snapshot {
    digest: [u8; 32],
    labels: BTreeSet<Label>,
}

/// Default [`ChangeTracker`]
#[derive(Debug, Default)]
pub struct IdentityMap {
    snapshots: FxHashMap<(TypeName, i64), Snapshot>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(entity: &Entity) -> Option<(TypeName, i64)> {
        entity.id().map(|id| (entity.type_name().clone(), id))
    }
}

impl ChangeTracker for IdentityMap {
    fn remember(&mut self, entity: &Entity) {
        let Some(key) = Self::key(entity) else {
            trace!("Not remembering {} without an id", entity.type_name());
            return;
        };
        self.snapshots.insert(
            key,
            Snapshot {
                digest: digest(entity),
                labels: entity.labels().clone(),
            },
        );
    }

    fn remembered(&self, entity: &Entity) -> bool {
        Self::key(entity)
            .and_then(|key| self.snapshots.get(&key))
            .map(|snapshot| snapshot.digest == digest(entity))
            .unwrap_or(false)
    }

    fn label_history(&self, entity: &Entity) -> LabelHistory {
        let previous = Self::key(entity)
            .and_then(|key| self.snapshots.get(&key))
            .map(|snapshot| snapshot.labels.clone())
            .unwrap_or_default();
        LabelHistory::new(previous, entity.labels().clone())
    }

    fn clear(&mut self) {
        self.snapshots.clear();
    }

    fn len(&self) -> usize {
        self.snapshots.len()
    }
}

/// Digest of everything that makes an entity dirty when changed
pub fn digest(entity: &Entity) -> [u8; 32] {
    let mut hasher = Sha256::new();
    update_str(&mut hasher, entity.type_name().as_str());

    hasher.update((entity.labels().len() as u64).to_le_bytes());
    for label in entity.labels() {
        update_str(&mut hasher, label.as_str());
    }

    let mut keys: Vec<&String> = entity.properties().keys().collect();
    keys.sort();
    hasher.update((keys.len() as u64).to_le_bytes());
    for key in keys {
        update_str(&mut hasher, key);
        hash_value(&mut hasher, &entity.properties()[key]);
    }

    let mut fields: Vec<&String> = entity.references().keys().collect();
    fields.sort();
    hasher.update((fields.len() as u64).to_le_bytes());
    for field in fields {
        update_str(&mut hasher, field);
        match entity.references()[field].id() {
            Some(id) => {
                hasher.update([1u8]);
                hasher.update(id.to_le_bytes());
            }
            None => hasher.update([0u8]),
        }
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

// Length-prefixed so ("ab", "c") and ("a", "bc") differ.
fn update_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_value(hasher: &mut Sha256, value: &PropertyValue) {
    match value {
        PropertyValue::String(s) => {
            hasher.update([0u8]);
            update_str(hasher, s);
        }
        PropertyValue::Integer(i) => {
            hasher.update([1u8]);
            hasher.update(i.to_le_bytes());
        }
        PropertyValue::Float(f) => {
            hasher.update([2u8]);
            hasher.update(f.to_bits().to_le_bytes());
        }
        PropertyValue::Boolean(b) => hasher.update([3u8, *b as u8]),
        PropertyValue::DateTime(dt) => {
            hasher.update([4u8]);
            hasher.update(dt.to_le_bytes());
        }
        PropertyValue::Array(items) => {
            hasher.update([5u8]);
            hasher.update((items.len() as u64).to_le_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        PropertyValue::Map(map) => {
            hasher.update([6u8]);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            hasher.update((keys.len() as u64).to_le_bytes());
            for key in keys {
                update_str(hasher, key);
                hash_value(hasher, &map[key]);
            }
        }
        PropertyValue::Null => hasher.update([7u8]),
    }
}
