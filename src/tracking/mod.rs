//! Dirty tracking
//!
//! A [`ChangeTracker`] remembers what an entity looked like when it was
//! registered and later reports whether it still looks the same. Dirty state
//! is always derived from the tracker, never stored on the entity.

pub mod identity_map;

pub use identity_map::IdentityMap;

use crate::entity::Entity;
use crate::graph::Label;
use std::collections::BTreeSet;

/// Remembers entity snapshots and compares against them on demand
pub trait ChangeTracker {
    /// Take a snapshot of the entity's current state, replacing any earlier one
    fn remember(&mut self, entity: &Entity);

    /// `true` when the entity still matches its snapshot. Entities that were
    /// never remembered (or have no id) report `false`.
    fn remembered(&self, entity: &Entity) -> bool;

    /// Labels at snapshot time alongside the current labels
    fn label_history(&self, entity: &Entity) -> LabelHistory;

    /// Forget every snapshot
    fn clear(&mut self);

    /// Number of remembered snapshots
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Labels an entity had when registered, and the labels it has now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelHistory {
    previous: BTreeSet<Label>,
    current: BTreeSet<Label>,
}

impl LabelHistory {
    pub fn new(previous: BTreeSet<Label>, current: BTreeSet<Label>) -> Self {
        LabelHistory { previous, current }
    }

    pub fn previous(&self) -> &BTreeSet<Label> {
        &self.previous
    }

    pub fn current(&self) -> &BTreeSet<Label> {
        &self.current
    }

    /// Labels present now but not at snapshot time
    pub fn added(&self) -> BTreeSet<Label> {
        self.current.difference(&self.previous).cloned().collect()
    }

    /// Labels present at snapshot time but gone now
    pub fn removed(&self) -> BTreeSet<Label> {
        self.previous.difference(&self.current).cloned().collect()
    }

    pub fn is_changed(&self) -> bool {
        self.previous != self.current
    }
}
