// ── Ingestion server ──
//
// One task per connection, one read per connection. Bind failure is
// fatal; everything after that is absorbed: accept errors are logged
// and the loop continues, per-connection errors drop the connection.
// Shutdown is cooperative through a CancellationToken, with a bounded
// grace period for connections still in flight.

use std::net::SocketAddr;
use std::time::Duration;

use fleetwatch_core::config::MonitorConfig;
use fleetwatch_core::Monitor;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::error::IngestError;
use crate::protocol::{self, Request, MAX_PAYLOAD};

pub struct IngestServer {
    listener: TcpListener,
    monitor: Monitor,
    read_timeout: Duration,
    shutdown_grace: Duration,
}

impl IngestServer {
    /// Bind the telemetry listener. This is the only fatal step.
    pub async fn bind(config: &MonitorConfig, monitor: Monitor) -> Result<Self, IngestError> {
        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| IngestError::Bind { addr: addr.clone(), source })?;
        info!(%addr, "telemetry listener bound");
        Ok(Self {
            listener,
            monitor,
            read_timeout: config.read_timeout(),
            shutdown_grace: config.shutdown_grace(),
        })
    }

    /// The bound address; useful when the configured port was 0.
    pub fn local_addr(&self) -> Result<SocketAddr, IngestError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires, then wait out the grace
    /// period for in-flight handlers.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), IngestError> {
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let monitor = self.monitor.clone();
                        let read_timeout = self.read_timeout;
                        tracker.spawn(async move {
                            handle_connection(stream, peer, &monitor, read_timeout).await;
                        });
                    }
                    // Transient (EMFILE, aborted handshake); keep accepting.
                    Err(err) => error!(%err, "accept failed"),
                },
            }
        }

        tracker.close();
        info!("telemetry listener stopping");
        if timeout(self.shutdown_grace, tracker.wait()).await.is_err() {
            warn!(
                remaining = tracker.len(),
                "connection handlers outlived the shutdown grace period"
            );
        }
        Ok(())
    }
}

/// Serve one connection: a single bounded read, an optional reply, done.
/// Nothing here can fail the server.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    monitor: &Monitor,
    read_timeout: Duration,
) {
    let mut buf = [0u8; MAX_PAYLOAD];
    let read = timeout(read_timeout, stream.read(&mut buf)).await;
    let n = match read {
        Ok(Ok(0)) => {
            debug!(%peer, "connection closed before sending");
            return;
        }
        Ok(Ok(n)) => n,
        Ok(Err(err)) => {
            debug!(%peer, %err, "read failed");
            return;
        }
        Err(_) => {
            debug!(%peer, "read timed out");
            return;
        }
    };

    match protocol::parse(&buf[..n]) {
        Ok(Request::CountQuery) => {
            let count = monitor.entity_count().to_string();
            if let Err(err) = stream.write_all(count.as_bytes()).await {
                debug!(%peer, %err, "count reply failed");
            } else {
                debug!(%peer, %count, "count query answered");
            }
        }
        Ok(Request::Measurement { id, value }) => {
            monitor.upsert_measurement(id, value);
            debug!(%peer, %id, value, "measurement ingested");
        }
        // Malformed input gets no reply and no error surface.
        Err(err) => debug!(%peer, %err, "payload dropped"),
    }
}
