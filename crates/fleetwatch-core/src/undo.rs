// ── Single-level undo ──
//
// Every mutating operation records its semantic inverse here. A single
// slot, not a stack: a second record replaces the first. `take()` clears
// the slot before the caller applies the action, so an inverse that
// records its own inverse during replay is not immediately lost.

use crate::filter::FilterState;
use crate::model::{Entity, EntityId};
use crate::topology::Connection;

/// The inverse of one mutating operation, as data.
///
/// Applied by the [`Monitor`](crate::Monitor) under the same lock as normal
/// operations; undo is not privileged and cannot bypass invariants.
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// Re-insert an entity removed from the registry.
    RestoreEntity(Box<Entity>),
    /// Remove an entity that was added.
    RemoveEntity(EntityId),
    /// Restore the slot occupancy captured before a placement (covers
    /// plain moves, evictions, and swaps alike).
    RestoreSlots([Option<EntityId>; crate::topology::SLOT_COUNT]),
    /// Restore a full topology snapshot (slots and connections) captured
    /// before a bulk clear.
    RestoreTopology {
        slots: [Option<EntityId>; crate::topology::SLOT_COUNT],
        connections: Vec<Connection>,
    },
    /// Restore the filter state captured before a filter change.
    RestoreFilter(FilterState),
}

/// Holder of the single current undo candidate.
#[derive(Debug, Default)]
pub struct UndoSlot {
    current: Option<UndoAction>,
}

impl UndoSlot {
    /// Record a new candidate, replacing whatever was there.
    pub fn record(&mut self, action: UndoAction) {
        self.current = Some(action);
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some()
    }

    /// Take and clear the candidate. Clearing happens here, before the
    /// caller executes the action.
    pub fn take(&mut self) -> Option<UndoAction> {
        self.current.take()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn second_record_replaces_first() {
        let mut slot = UndoSlot::default();
        slot.record(UndoAction::RemoveEntity(EntityId::new(1).unwrap()));
        slot.record(UndoAction::RemoveEntity(EntityId::new(2).unwrap()));

        match slot.take() {
            Some(UndoAction::RemoveEntity(id)) => assert_eq!(id.get(), 2),
            other => panic!("unexpected candidate: {other:?}"),
        }
        // Single level: nothing left to undo.
        assert!(!slot.can_undo());
        assert!(slot.take().is_none());
    }

    #[test]
    fn take_clears_before_execution() {
        let mut slot = UndoSlot::default();
        slot.record(UndoAction::RemoveEntity(EntityId::new(1).unwrap()));
        let action = slot.take();
        assert!(action.is_some());
        // A replay that records a new inverse must not be clobbered.
        slot.record(UndoAction::RemoveEntity(EntityId::new(3).unwrap()));
        assert!(slot.can_undo());
    }
}
