// ── Entity registry ──
//
// Authoritative, insertion-ordered storage for monitored entities plus a
// bounded per-entity measurement history. Pure data structure: the
// synchronization boundary lives in the Monitor facade that owns it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::{
    Entity, EntityId, MeasurementHistory, MeasurementSample, DEFAULT_HISTORY_DEPTH,
};

#[derive(Debug)]
pub struct Registry {
    /// Insertion order is preserved so `all()` is stable for display.
    entities: IndexMap<EntityId, Entity>,
    history: HashMap<EntityId, MeasurementHistory>,
    history_depth: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl Registry {
    pub fn new(history_depth: usize) -> Self {
        Self {
            entities: IndexMap::new(),
            history: HashMap::new(),
            history_depth,
        }
    }

    /// Insert a new entity. Fails without touching the registry if the id
    /// is already present.
    pub fn add(&mut self, entity: Entity) -> Result<(), CoreError> {
        if self.entities.contains_key(&entity.id) {
            return Err(CoreError::DuplicateId(entity.id));
        }
        self.entities.insert(entity.id, entity);
        Ok(())
    }

    /// Remove and return an entity. The caller (the monitor) is responsible
    /// for purging slots and connections in the same logical step.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        // shift_remove keeps the insertion order of the remaining entities.
        let removed = self.entities.shift_remove(&id);
        if removed.is_some() {
            self.history.remove(&id);
        }
        removed
    }

    /// Create-or-update from a telemetry measurement.
    ///
    /// Unknown ids synthesize a new entity (category from the mod-10 table,
    /// synthesized name and address); known ids update `last_value` and
    /// `last_update`. A history sample is appended either way. Returns the
    /// entity after the change and whether it was newly created.
    pub fn upsert_measurement(
        &mut self,
        id: EntityId,
        value: f64,
        now: DateTime<Utc>,
    ) -> (&Entity, bool) {
        let created = !self.entities.contains_key(&id);
        let entity = self
            .entities
            .entry(id)
            .and_modify(|e| {
                e.last_value = value;
                e.last_update = now;
            })
            .or_insert_with(|| Entity::synthesized(id, value, now));

        self.history
            .entry(id)
            .or_insert_with(|| MeasurementHistory::new(self.history_depth))
            .push(MeasurementSample::new(id, value, now));

        (entity, created)
    }

    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All entities in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Retained samples for one entity, oldest first. Empty if unknown.
    pub fn history(&self, id: EntityId) -> impl Iterator<Item = &MeasurementSample> {
        self.history.get(&id).into_iter().flat_map(MeasurementHistory::samples)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Category, Status};
    use pretty_assertions::assert_eq;

    fn id(n: u32) -> EntityId {
        EntityId::new(n).unwrap()
    }

    fn entity(n: u32) -> Entity {
        Entity::synthesized(id(n), 60.0, Utc::now())
    }

    #[test]
    fn add_rejects_duplicate_and_leaves_registry_unchanged() {
        let mut reg = Registry::default();
        reg.add(entity(1)).unwrap();
        let before: Vec<Entity> = reg.all().cloned().collect();

        let mut dup = entity(1);
        dup.name = "Imposter".into();
        assert_eq!(reg.add(dup), Err(CoreError::DuplicateId(id(1))));

        let after: Vec<Entity> = reg.all().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn upsert_synthesizes_unknown_entity() {
        let mut reg = Registry::default();
        let (e, created) = reg.upsert_measurement(id(3), 60.0, Utc::now());
        assert!(created);
        assert_eq!(e.category, Category::File);
        assert_eq!(e.name, "Server 003");
        assert_eq!(e.last_value, 60.0);
        assert_eq!(reg.history(id(3)).count(), 1);
    }

    #[test]
    fn upsert_updates_existing_entity_in_place() {
        let mut reg = Registry::default();
        reg.add(entity(2)).unwrap();
        let (e, created) = reg.upsert_measurement(id(2), 90.0, Utc::now());
        assert!(!created);
        assert_eq!(e.last_value, 90.0);
        assert_eq!(e.status(), Status::Warning);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn history_is_bounded_fifo() {
        let mut reg = Registry::new(5);
        for v in 1..=8 {
            reg.upsert_measurement(id(1), f64::from(v), Utc::now());
        }
        let values: Vec<f64> = reg.history(id(1)).map(|s| s.value).collect();
        assert_eq!(values, vec![4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn all_iterates_in_insertion_order_across_removal() {
        let mut reg = Registry::default();
        for n in [5, 1, 9, 3] {
            reg.add(entity(n)).unwrap();
        }
        reg.remove(id(1));
        let order: Vec<u32> = reg.all().map(|e| e.id.get()).collect();
        assert_eq!(order, vec![5, 9, 3]);
    }

    #[test]
    fn remove_drops_history() {
        let mut reg = Registry::default();
        reg.upsert_measurement(id(1), 60.0, Utc::now());
        assert!(reg.remove(id(1)).is_some());
        assert_eq!(reg.history(id(1)).count(), 0);
        assert!(reg.remove(id(1)).is_none());
    }
}
