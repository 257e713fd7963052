//! Core domain layer for the fleetwatch monitoring dashboard.
//!
//! This crate owns the business logic shared by the ingestion server and the
//! operator CLI:
//!
//! - **[`Monitor`]**: central facade over all shared state. Cheaply cloneable
//!   via an inner `Arc`; every mutation (operator command, telemetry upsert,
//!   undo) goes through one synchronization boundary so concurrent readers
//!   never observe a torn update.
//!
//! - **[`Registry`]**: insertion-ordered entity storage with create-or-update
//!   semantics for incoming measurements and a bounded per-entity sample
//!   history for charting.
//!
//! - **[`topology`]**: 12 fixed display slots plus a graph of visual
//!   connections between slotted entities, with duplicate-prevention and
//!   swap semantics under interactive mutation.
//!
//! - **[`undo`]**: single-slot undo candidate. Every mutating operation
//!   records its semantic inverse, and one `undo` replays it.
//!
//! - **[`filter`]**: stateless predicate over the registry with a
//!   mutually-exclusive tri-state id comparison.

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod monitor;
pub mod registry;
pub mod topology;
pub mod undo;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MonitorConfig;
pub use error::CoreError;
pub use filter::{Comparison, FilterState};
pub use model::{Category, Entity, EntityDraft, EntityId, HostAddress, MeasurementSample, Status};
pub use monitor::{ChangeKind, Monitor, RegistryEvent};
pub use registry::Registry;
pub use topology::{Connection, Topology, SLOT_COUNT};
pub use undo::{UndoAction, UndoSlot};
