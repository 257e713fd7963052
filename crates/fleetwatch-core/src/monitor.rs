// ── Monitor facade ──
//
// Single entry point for every consumer: ingestion workers, the operator
// console, and tests. Cheaply cloneable via `Arc<MonitorInner>`. One mutex
// guards the registry, topology, undo slot, and filter together, so every
// multi-step mutation (swap, bulk clear, removal cleanup, undo replay) is
// atomic with respect to concurrent readers and writers. The lock is never
// held across an await point.
//
// Observers get a `watch` snapshot of all entities (rebuilt on mutation)
// and a `broadcast` stream of registry change events; neither is required
// for correctness, both are pure side channels.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::filter::{Comparison, FilterState};
use crate::model::{Category, Entity, EntityDraft, EntityId, MeasurementSample};
use crate::registry::Registry;
use crate::topology::{Connection, ToggleOutcome, Topology, SLOT_COUNT};
use crate::undo::{UndoAction, UndoSlot};

const EVENT_CHANNEL_SIZE: usize = 256;

// ── Change events ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// One registry mutation, published to passive observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEvent {
    pub id: EntityId,
    pub kind: ChangeKind,
}

// ── Monitor ─────────────────────────────────────────────────────────

struct MonitorState {
    registry: Registry,
    topology: Topology,
    undo: UndoSlot,
    filter: FilterState,
}

struct MonitorInner {
    state: Mutex<MonitorState>,
    snapshot: watch::Sender<Arc<Vec<Entity>>>,
    events: broadcast::Sender<RegistryEvent>,
}

/// Shared handle to all monitoring state.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

impl Monitor {
    pub fn new(config: &MonitorConfig) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(MonitorInner {
                state: Mutex::new(MonitorState {
                    registry: Registry::new(config.history_depth),
                    topology: Topology::default(),
                    undo: UndoSlot::default(),
                    filter: FilterState::default(),
                }),
                snapshot,
                events,
            }),
        }
    }

    /// A poisoned mutex only means a worker panicked mid-operation; the
    /// state itself is guarded against partial writes by the operation
    /// structure, so ingestion keeps going.
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &MonitorState, event: RegistryEvent) {
        let snap: Vec<Entity> = state.registry.all().cloned().collect();
        self.inner.snapshot.send_modify(|s| *s = Arc::new(snap));
        let _ = self.inner.events.send(event);
    }

    // ── Registry operations ──────────────────────────────────────

    /// Validate and add an operator-entered entity.
    pub fn add_entity(&self, draft: EntityDraft) -> Result<Entity, CoreError> {
        let entity = draft.validate(Utc::now())?;
        let mut state = self.lock();
        state.registry.add(entity.clone())?;
        state.undo.record(UndoAction::RemoveEntity(entity.id));
        info!(id = %entity.id, name = %entity.name, "entity added");
        self.publish(&state, RegistryEvent { id: entity.id, kind: ChangeKind::Added });
        Ok(entity)
    }

    /// Remove an entity and, in the same step, purge its slot placement
    /// and connections.
    pub fn remove_entity(&self, id: EntityId) -> Result<Entity, CoreError> {
        let mut state = self.lock();
        let entity = state.registry.remove(id).ok_or(CoreError::NotFound(id))?;
        state.topology.purge_entity(id);
        state.undo.record(UndoAction::RestoreEntity(Box::new(entity.clone())));
        info!(id = %id, name = %entity.name, "entity removed");
        self.publish(&state, RegistryEvent { id, kind: ChangeKind::Removed });
        Ok(entity)
    }

    /// Telemetry upsert: create-or-update keyed by entity id.
    ///
    /// Not undo-recorded: measurements are external facts, not operator
    /// actions.
    pub fn upsert_measurement(&self, id: EntityId, value: f64) -> Entity {
        let mut state = self.lock();
        let (entity, created) = state.registry.upsert_measurement(id, value, Utc::now());
        let entity = entity.clone();
        let kind = if created { ChangeKind::Added } else { ChangeKind::Updated };
        debug!(id = %id, value, created, "measurement upserted");
        self.publish(&state, RegistryEvent { id, kind });
        entity
    }

    pub fn find(&self, id: EntityId) -> Option<Entity> {
        self.lock().registry.find(id).cloned()
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.lock().registry.all().cloned().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn history(&self, id: EntityId) -> Vec<MeasurementSample> {
        self.lock().registry.history(id).cloned().collect()
    }

    // ── Topology operations ──────────────────────────────────────

    /// Place an entity into a display slot. `source` is the slot the drag
    /// started from, or `None` when dragging from the unplaced pool;
    /// an occupied target swaps with a known source and evicts otherwise.
    pub fn place_in_slot(
        &self,
        id: EntityId,
        target: usize,
        source: Option<usize>,
    ) -> Result<(), CoreError> {
        let mut state = self.lock();
        // Reborrow so topology and registry borrows stay disjoint.
        let state = &mut *state;
        if !state.registry.contains(id) {
            return Err(CoreError::NotFound(id));
        }
        let before = *state.topology.slots();
        state.topology.place(id, target, source)?;
        state.topology.refresh_connections(&state.registry);
        state.undo.record(UndoAction::RestoreSlots(before));
        debug!(id = %id, target, ?source, "entity placed in slot");
        Ok(())
    }

    /// Clear a slot and purge its occupant's connections. The inverse
    /// restores the placement only; purged connections stay gone.
    pub fn remove_from_slot(&self, index: usize) -> Result<Option<EntityId>, CoreError> {
        let mut state = self.lock();
        let state = &mut *state;
        let before = *state.topology.slots();
        let evicted = state.topology.remove_from_slot(index)?;
        if evicted.is_some() {
            state.topology.refresh_connections(&state.registry);
            state.undo.record(UndoAction::RestoreSlots(before));
        }
        Ok(evicted)
    }

    /// Connection-mode click on a slot.
    pub fn toggle_connection(&self, index: usize) -> Result<ToggleOutcome, CoreError> {
        let mut state = self.lock();
        let slots = *state.topology.slots();
        let connections = state.topology.connections().to_vec();
        let outcome = state.topology.toggle_connection(index)?;
        if let ToggleOutcome::Connected(a, b) = outcome {
            state.undo.record(UndoAction::RestoreTopology { slots, connections });
            debug!(a = %a, b = %b, "connection created");
        }
        Ok(outcome)
    }

    /// Abandon a half-finished connection gesture (mode exit).
    pub fn clear_pending_connection(&self) {
        self.lock().topology.clear_pending();
    }

    /// Empty every slot; connections survive soft-hidden. One inverse
    /// restores the full prior snapshot.
    pub fn clear_slots(&self) {
        let mut state = self.lock();
        let slots = *state.topology.slots();
        let connections = state.topology.connections().to_vec();
        state.topology.clear_slots();
        state.undo.record(UndoAction::RestoreTopology { slots, connections });
        info!("all slots cleared");
    }

    /// Drop every connection. One inverse restores the full prior snapshot.
    pub fn clear_connections(&self) {
        let mut state = self.lock();
        let slots = *state.topology.slots();
        let connections = state.topology.connections().to_vec();
        state.topology.clear_connections();
        state.undo.record(UndoAction::RestoreTopology { slots, connections });
        info!("all connections cleared");
    }

    /// Fill slots from the front with registry entities in insertion order.
    pub fn auto_arrange(&self) {
        let mut state = self.lock();
        let state = &mut *state;
        let slots = *state.topology.slots();
        let connections = state.topology.connections().to_vec();
        let ids: Vec<EntityId> = state.registry.all().map(|e| e.id).collect();
        state.topology.auto_arrange(ids);
        state.topology.refresh_connections(&state.registry);
        state.undo.record(UndoAction::RestoreTopology { slots, connections });
    }

    pub fn slots(&self) -> [Option<EntityId>; SLOT_COUNT] {
        *self.lock().topology.slots()
    }

    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.lock().topology.slot_of(id)
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.lock().topology.connections().to_vec()
    }

    pub fn connection_exists(&self, a: EntityId, b: EntityId) -> bool {
        self.lock().topology.connection_exists(a, b)
    }

    // ── Filter operations ────────────────────────────────────────

    pub fn filter(&self) -> FilterState {
        self.lock().filter
    }

    pub fn select_comparison(&self, comparison: Comparison) {
        let mut state = self.lock();
        let before = state.filter;
        state.filter.select_comparison(comparison);
        state.undo.record(UndoAction::RestoreFilter(before));
    }

    pub fn set_filter_category(&self, category: Option<Category>) {
        let mut state = self.lock();
        let before = state.filter;
        state.filter.set_category(category);
        state.undo.record(UndoAction::RestoreFilter(before));
    }

    /// Typing a threshold is not undo-recorded on its own; it only takes
    /// effect once a comparison is selected.
    pub fn set_filter_threshold(&self, threshold: u32) {
        self.lock().filter.set_threshold(threshold);
    }

    pub fn clear_filter(&self) {
        let mut state = self.lock();
        let before = state.filter;
        state.filter.clear();
        state.undo.record(UndoAction::RestoreFilter(before));
    }

    /// Entities passing the current filter, in insertion order.
    pub fn filtered_entities(&self) -> Vec<Entity> {
        let state = self.lock();
        state
            .registry
            .all()
            .filter(|e| state.filter.matches(e))
            .cloned()
            .collect()
    }

    // ── Undo ─────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.lock().undo.can_undo()
    }

    /// Replay the single undo candidate. Returns false when there is
    /// nothing to undo, which is a normal outcome rather than an error.
    pub fn undo(&self) -> bool {
        let mut state = self.lock();
        let state = &mut *state;
        // The slot is cleared by take() before the action runs, so a
        // replay that records its own inverse is preserved.
        let Some(action) = state.undo.take() else {
            return false;
        };

        let event = match action {
            UndoAction::RestoreEntity(entity) => {
                let id = entity.id;
                // The id was free when the removal was recorded; a
                // duplicate can only appear if telemetry re-created it,
                // in which case the live entity wins.
                let _ = state.registry.add(*entity);
                Some(RegistryEvent { id, kind: ChangeKind::Added })
            }
            UndoAction::RemoveEntity(id) => {
                state.registry.remove(id);
                state.topology.purge_entity(id);
                Some(RegistryEvent { id, kind: ChangeKind::Removed })
            }
            UndoAction::RestoreSlots(slots) => {
                state.topology.restore_slots(slots);
                state.topology.refresh_connections(&state.registry);
                None
            }
            UndoAction::RestoreTopology { slots, connections } => {
                state.topology.restore(slots, connections);
                state.topology.refresh_connections(&state.registry);
                None
            }
            UndoAction::RestoreFilter(filter) => {
                state.filter = filter;
                None
            }
        };

        info!("undo executed");
        if let Some(event) = event {
            self.publish(state, event);
        }
        true
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to full entity snapshots (rebuilt on every mutation).
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Entity>>> {
        self.inner.snapshot.subscribe()
    }

    /// Subscribe to registry change events.
    pub fn events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: u32) -> EntityId {
        EntityId::new(n).unwrap()
    }

    fn monitor_with(ids: &[u32]) -> Monitor {
        let monitor = Monitor::default();
        for n in ids {
            monitor.upsert_measurement(id(*n), 60.0);
        }
        monitor
    }

    #[test]
    fn upsert_creates_entity_with_derived_category() {
        let monitor = Monitor::default();
        let entity = monitor.upsert_measurement(id(3), 60.0);
        assert_eq!(entity.id, id(3));
        assert_eq!(entity.last_value, 60.0);
        assert_eq!(entity.category, Category::File);
        assert_eq!(monitor.entity_count(), 1);
    }

    #[test]
    fn add_duplicate_reports_error_and_changes_nothing() {
        let monitor = monitor_with(&[1]);
        let draft = EntityDraft {
            id: 1,
            name: "Shadow".into(),
            address: "10.0.0.1".into(),
            category: None,
        };
        assert_eq!(monitor.add_entity(draft).unwrap_err(), CoreError::DuplicateId(id(1)));
        assert_eq!(monitor.entity_count(), 1);
        assert_eq!(monitor.find(id(1)).unwrap().name, "Server 001");
    }

    #[test]
    fn swap_and_single_undo_restores_both() {
        let monitor = monitor_with(&[1, 2]);
        monitor.place_in_slot(id(1), 0, None).unwrap();
        monitor.place_in_slot(id(2), 3, None).unwrap();

        // Drag entity 2 out of slot 3 onto occupied slot 0.
        monitor.place_in_slot(id(2), 0, Some(3)).unwrap();
        assert_eq!(monitor.slot_of(id(2)), Some(0));
        assert_eq!(monitor.slot_of(id(1)), Some(3));

        assert!(monitor.undo());
        assert_eq!(monitor.slot_of(id(1)), Some(0));
        assert_eq!(monitor.slot_of(id(2)), Some(3));
    }

    #[test]
    fn undo_is_single_level() {
        let monitor = monitor_with(&[1, 2]);
        monitor.place_in_slot(id(1), 0, None).unwrap(); // action X
        monitor.place_in_slot(id(2), 1, None).unwrap(); // action Y

        assert!(monitor.undo()); // reverses Y only
        assert_eq!(monitor.slot_of(id(1)), Some(0));
        assert_eq!(monitor.slot_of(id(2)), None);

        assert!(!monitor.undo()); // nothing left
        assert_eq!(monitor.slot_of(id(1)), Some(0));
    }

    #[test]
    fn remove_entity_purges_slot_and_connection_in_one_step() {
        let monitor = monitor_with(&[1, 2]);
        monitor.place_in_slot(id(1), 0, None).unwrap();
        monitor.place_in_slot(id(2), 1, None).unwrap();
        monitor.toggle_connection(0).unwrap();
        monitor.toggle_connection(1).unwrap();
        assert!(monitor.connection_exists(id(1), id(2)));

        monitor.remove_entity(id(1)).unwrap();
        assert_eq!(monitor.slot_of(id(1)), None);
        assert!(!monitor.connection_exists(id(1), id(2)));
        assert!(monitor.connections().is_empty());
    }

    #[test]
    fn undo_of_removal_restores_entity() {
        let monitor = monitor_with(&[1]);
        let before = monitor.find(id(1)).unwrap();
        monitor.remove_entity(id(1)).unwrap();
        assert_eq!(monitor.entity_count(), 0);

        assert!(monitor.undo());
        assert_eq!(monitor.find(id(1)).unwrap(), before);
    }

    #[test]
    fn undo_of_add_removes_entity_again() {
        let monitor = Monitor::default();
        let draft = EntityDraft {
            id: 4,
            name: "Edge".into(),
            address: "10.1.1.4".into(),
            category: Some(Category::Web),
        };
        monitor.add_entity(draft).unwrap();
        assert!(monitor.undo());
        assert_eq!(monitor.entity_count(), 0);
    }

    #[test]
    fn remove_from_slot_undo_does_not_restore_connections() {
        let monitor = monitor_with(&[1, 2]);
        monitor.place_in_slot(id(1), 0, None).unwrap();
        monitor.place_in_slot(id(2), 1, None).unwrap();
        monitor.toggle_connection(0).unwrap();
        monitor.toggle_connection(1).unwrap();

        monitor.remove_from_slot(0).unwrap();
        assert!(monitor.connections().is_empty());

        assert!(monitor.undo());
        assert_eq!(monitor.slot_of(id(1)), Some(0));
        // Connections are outside this action's undo scope.
        assert!(monitor.connections().is_empty());
    }

    #[test]
    fn placement_reconciles_connection_visibility() {
        let monitor = monitor_with(&[1, 2]);
        monitor.place_in_slot(id(1), 0, None).unwrap();
        monitor.place_in_slot(id(2), 1, None).unwrap();
        monitor.toggle_connection(0).unwrap();
        monitor.toggle_connection(1).unwrap();

        monitor.clear_slots();
        assert!(!monitor.connections()[0].visible);

        // Re-slotting both endpoints through the facade makes the
        // soft-hidden connection visible again.
        monitor.place_in_slot(id(1), 4, None).unwrap();
        monitor.place_in_slot(id(2), 5, None).unwrap();
        assert!(monitor.connections()[0].visible);

        monitor.auto_arrange();
        assert!(monitor.connections()[0].visible);
    }

    #[test]
    fn bulk_clear_restores_atomically() {
        let monitor = monitor_with(&[1, 2, 3]);
        monitor.auto_arrange();
        monitor.toggle_connection(0).unwrap();
        monitor.toggle_connection(1).unwrap();

        monitor.clear_slots();
        assert!(monitor.slots().iter().all(Option::is_none));
        assert!(!monitor.connections()[0].visible);

        assert!(monitor.undo());
        assert_eq!(monitor.slot_of(id(1)), Some(0));
        assert_eq!(monitor.slot_of(id(3)), Some(2));
        assert!(monitor.connections()[0].visible);
    }

    #[test]
    fn filter_snapshot_undo() {
        let monitor = monitor_with(&[1, 2, 3]);
        monitor.set_filter_threshold(2);
        monitor.select_comparison(Comparison::LessThan);
        assert_eq!(monitor.filtered_entities().len(), 1);

        monitor.select_comparison(Comparison::GreaterThan);
        assert_eq!(monitor.filter().comparison, Some(Comparison::GreaterThan));

        assert!(monitor.undo());
        assert_eq!(monitor.filter().comparison, Some(Comparison::LessThan));
    }

    #[test]
    fn events_are_broadcast_for_mutations() {
        let monitor = Monitor::default();
        let mut rx = monitor.events();
        monitor.upsert_measurement(id(7), 50.0);
        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent { id: id(7), kind: ChangeKind::Added }
        );
        monitor.upsert_measurement(id(7), 55.0);
        assert_eq!(
            rx.try_recv().unwrap(),
            RegistryEvent { id: id(7), kind: ChangeKind::Updated }
        );
    }

    #[test]
    fn snapshot_watch_tracks_registry() {
        let monitor = Monitor::default();
        let rx = monitor.subscribe();
        monitor.upsert_measurement(id(1), 60.0);
        monitor.upsert_measurement(id(2), 70.0);
        let snap = rx.borrow().clone();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, id(1));
    }
}
