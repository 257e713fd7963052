// ── Display topology ──
//
// A fixed array of placement slots and a graph of visual connections
// between slotted entities. Slots and connections hold entity ids only;
// the registry owns entity lifetime. Invariants enforced here:
//
// - an entity occupies at most one slot at any time
// - at most one connection per unordered pair, never self-connections
// - a connection is soft-hidden while an endpoint is unslotted and
//   hard-deleted only when the endpoint leaves the registry
//
// Pure data structure; the Monitor facade provides locking and undo.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::EntityId;
use crate::registry::Registry;

/// Fixed slot cardinality, rendered as 3 rows by 4 columns.
pub const SLOT_COUNT: usize = 12;

/// Row/column of a slot index. Rendering geometry only; carries no
/// behavioral meaning.
pub fn slot_position(index: usize) -> (usize, usize) {
    (index / 4, index % 4)
}

// ── Connection ──────────────────────────────────────────────────────

/// Undirected link between two slotted entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub a: EntityId,
    pub b: EntityId,
    /// False while an endpoint is temporarily unslotted.
    pub visible: bool,
}

impl Connection {
    fn links(&self, x: EntityId, y: EntityId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    fn touches(&self, id: EntityId) -> bool {
        self.a == id || self.b == id
    }
}

/// What a connection-mode click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// First click: endpoint recorded, waiting for the second.
    PendingSet(EntityId),
    /// Second click: connection created.
    Connected(EntityId, EntityId),
    /// Empty slot, same entity, or duplicate pair.
    Ignored,
}

// ── Topology ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Topology {
    slots: [Option<EntityId>; SLOT_COUNT],
    connections: Vec<Connection>,
    /// First endpoint of an in-progress connection gesture.
    pending: Option<EntityId>,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            slots: [None; SLOT_COUNT],
            connections: Vec::new(),
            pending: None,
        }
    }
}

impl Topology {
    pub fn slots(&self) -> &[Option<EntityId>; SLOT_COUNT] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Result<Option<EntityId>, CoreError> {
        self.slots
            .get(index)
            .copied()
            .ok_or(CoreError::SlotOutOfRange(index))
    }

    /// The slot currently holding an entity, if any.
    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(id))
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_exists(&self, a: EntityId, b: EntityId) -> bool {
        self.connections.iter().any(|c| c.links(a, b))
    }

    pub fn pending_endpoint(&self) -> Option<EntityId> {
        self.pending
    }

    /// Abandon an in-progress connection gesture (mode exit).
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    // ── Placement ────────────────────────────────────────────────

    /// Place an entity into `target`, enforcing single-placement and swap
    /// semantics.
    ///
    /// Any slot already holding the entity is cleared first. If the target
    /// held a different entity and the move originated from a known slot
    /// (`source`), the displaced entity swaps into that slot; otherwise it
    /// is evicted to the unplaced pool. The caller snapshots `slots()`
    /// beforehand for undo and refreshes connection visibility afterwards.
    pub fn place(
        &mut self,
        id: EntityId,
        target: usize,
        source: Option<usize>,
    ) -> Result<(), CoreError> {
        if target >= SLOT_COUNT {
            return Err(CoreError::SlotOutOfRange(target));
        }
        if source.is_some_and(|s| s >= SLOT_COUNT) {
            return Err(CoreError::SlotOutOfRange(source.unwrap_or(target)));
        }

        let displaced = self.slots[target].filter(|d| *d != id);

        // Duplicate prevention: one slot per entity, always.
        for slot in &mut self.slots {
            if *slot == Some(id) {
                *slot = None;
            }
        }

        if let (Some(displaced), Some(source)) = (displaced, source) {
            if source != target {
                self.slots[source] = Some(displaced);
            }
        }

        self.slots[target] = Some(id);
        Ok(())
    }

    /// Clear one slot and hard-delete the connections of whatever entity
    /// held it. Returns the evicted entity, if any.
    pub fn remove_from_slot(&mut self, index: usize) -> Result<Option<EntityId>, CoreError> {
        if index >= SLOT_COUNT {
            return Err(CoreError::SlotOutOfRange(index));
        }
        let evicted = self.slots[index].take();
        if let Some(id) = evicted {
            self.connections.retain(|c| !c.touches(id));
        }
        Ok(evicted)
    }

    /// Connection-mode click on a slot.
    pub fn toggle_connection(&mut self, index: usize) -> Result<ToggleOutcome, CoreError> {
        let Some(clicked) = self.slot(index)? else {
            return Ok(ToggleOutcome::Ignored);
        };

        match self.pending {
            None => {
                self.pending = Some(clicked);
                Ok(ToggleOutcome::PendingSet(clicked))
            }
            Some(first) if first == clicked => Ok(ToggleOutcome::Ignored),
            Some(first) => {
                if self.connection_exists(first, clicked) {
                    return Ok(ToggleOutcome::Ignored);
                }
                self.connections.push(Connection {
                    a: first,
                    b: clicked,
                    visible: true,
                });
                self.pending = None;
                Ok(ToggleOutcome::Connected(first, clicked))
            }
        }
    }

    // ── Bulk operations ──────────────────────────────────────────

    /// Empty every slot. Connections survive soft-hidden; the caller
    /// captures a full snapshot for undo first.
    pub fn clear_slots(&mut self) {
        self.slots = [None; SLOT_COUNT];
        for c in &mut self.connections {
            c.visible = false;
        }
    }

    /// Drop every connection.
    pub fn clear_connections(&mut self) {
        self.connections.clear();
        self.pending = None;
    }

    /// Restore previously captured state (undo of a bulk clear).
    pub fn restore(
        &mut self,
        slots: [Option<EntityId>; SLOT_COUNT],
        connections: Vec<Connection>,
    ) {
        self.slots = slots;
        self.connections = connections;
        self.pending = None;
    }

    /// Restore slot occupancy only (undo of a placement).
    pub fn restore_slots(&mut self, slots: [Option<EntityId>; SLOT_COUNT]) {
        self.slots = slots;
    }

    /// Fill slots from the front with the first `SLOT_COUNT` entities.
    pub fn auto_arrange<I: IntoIterator<Item = EntityId>>(&mut self, ids: I) {
        self.slots = [None; SLOT_COUNT];
        for (slot, id) in self.slots.iter_mut().zip(ids) {
            *slot = Some(id);
        }
    }

    // ── Consistency ──────────────────────────────────────────────

    /// Mandatory cleanup when an entity leaves the registry: empty its
    /// slot and hard-delete every connection referencing it, in one step.
    pub fn purge_entity(&mut self, id: EntityId) {
        for slot in &mut self.slots {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.connections.retain(|c| !c.touches(id));
        if self.pending == Some(id) {
            self.pending = None;
        }
    }

    /// Recompute connection state after any slot or registry change:
    /// endpoints gone from the registry hard-delete the connection,
    /// unslotted endpoints soft-hide it.
    pub fn refresh_connections(&mut self, registry: &Registry) {
        self.connections
            .retain(|c| registry.contains(c.a) && registry.contains(c.b));
        let slots = self.slots;
        for c in &mut self.connections {
            let slotted =
                |id: EntityId| slots.iter().any(|s| *s == Some(id));
            c.visible = slotted(c.a) && slotted(c.b);
        }
    }
}
