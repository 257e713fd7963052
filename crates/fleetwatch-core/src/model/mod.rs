//! Canonical domain types.

mod entity;
mod measurement;

pub use entity::{Category, Entity, EntityDraft, EntityId, HostAddress, Status};
pub use measurement::{MeasurementHistory, MeasurementSample, DEFAULT_HISTORY_DEPTH, VALID_BAND};
