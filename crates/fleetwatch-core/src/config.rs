//! Runtime configuration consumed by the monitor and ingestion server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::DEFAULT_HISTORY_DEPTH;

/// Well-known telemetry port.
pub const DEFAULT_PORT: u16 = 25675;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address the ingestion listener binds to.
    pub listen_addr: String,
    /// TCP port for telemetry clients.
    pub port: u16,
    /// Per-connection read deadline in seconds. A client that connects and
    /// never sends data is dropped after this long instead of pinning a
    /// worker forever.
    pub read_timeout_secs: u64,
    /// How long shutdown waits for in-flight connection workers.
    pub shutdown_grace_secs: u64,
    /// Measurement samples retained per entity.
    pub history_depth: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            read_timeout_secs: 5,
            shutdown_grace_secs: 5,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl MonitorConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_wire_contract() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.port, 25675);
        assert_eq!(cfg.bind_address(), "0.0.0.0:25675");
        assert_eq!(cfg.history_depth, 5);
    }
}
