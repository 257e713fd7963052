use std::io;

use thiserror::Error;

/// Fatal ingestion failures. Per-connection problems are logged and
/// absorbed, never surfaced here.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The listen socket could not be bound; startup cannot proceed.
    #[error("failed to bind telemetry listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("telemetry listener i/o failure")]
    Io(#[from] io::Error),
}
