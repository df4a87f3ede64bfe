//! `EntityRegistry`: every entity seen during a run, keyed by id.

use std::collections::BTreeMap;

use rp_core::{EntityId, MergePolicy, VirtualTime};
use rp_history::Movement;

use crate::Entity;

/// What [`EntityRegistry::upsert`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Merged,
}

/// Add-only store of entities.
///
/// Iteration is in ascending id order so tick processing is deterministic.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    policy:   MergePolicy,
}

impl EntityRegistry {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            entities: BTreeMap::new(),
            policy,
        }
    }

    /// Create the entity, or merge `movements` into the existing one.
    /// Merging never replaces or de-duplicates movements.
    pub fn upsert(&mut self, id: EntityId, movements: Vec<Movement>) -> Upsert {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.add_movements(movements, self.policy);
                Upsert::Merged
            }
            None => {
                self.entities.insert(id, Entity::new(id, movements));
                Upsert::Created
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[inline]
    pub fn merge_policy(&self) -> MergePolicy {
        self.policy
    }

    /// Drop every waypoint older than `time` from every entity.  Returns the
    /// total number of waypoints discarded.
    pub fn prune(&mut self, time: VirtualTime) -> usize {
        self.entities.values_mut().map(|e| e.prune(time)).sum()
    }
}
