//! TCP telemetry ingestion for fleetwatch.
//!
//! Simulated probes connect, send one line-less text payload, and
//! disconnect. Two request shapes exist on the wire: a count query that
//! gets the registered entity total back as decimal text, and a
//! measurement report that is upserted into the shared [`Monitor`].
//! Anything else is dropped without a reply; a lying probe must never
//! take the server down.
//!
//! [`Monitor`]: fleetwatch_core::Monitor

pub mod error;
pub mod protocol;
pub mod server;

pub use error::IngestError;
pub use protocol::{Request, COUNT_QUERY, MAX_PAYLOAD};
pub use server::IngestServer;
