//! Core error taxonomy.
//!
//! Validation and not-found failures are recoverable and surfaced to the
//! caller with a structured reason; the operation that produced them leaves
//! no state change behind.

use thiserror::Error;

use crate::model::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Validation ───────────────────────────────────────────────────
    #[error("entity {0} already exists")]
    DuplicateId(EntityId),

    #[error("id must be greater than 0")]
    InvalidId,

    #[error("name is required")]
    MissingName,

    #[error("invalid address format {0:?} (expected dotted quad, e.g. 192.168.1.1)")]
    InvalidAddress(String),

    // ── Not found ────────────────────────────────────────────────────
    #[error("entity {0} not found")]
    NotFound(EntityId),

    #[error("slot index {0} out of range (0..{max})", max = crate::topology::SLOT_COUNT)]
    SlotOutOfRange(usize),
}
