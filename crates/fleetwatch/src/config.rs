//! Configuration loading: defaults, TOML file, environment overrides.
//!
//! Layering (later wins): built-in defaults, then `fleetwatch.toml` (or the
//! `--config` path), then `FLEETWATCH_*` environment variables with `__`
//! separating nesting levels (`FLEETWATCH_MONITOR__PORT=9000`).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use fleetwatch_core::config::MonitorConfig;
use serde::{Deserialize, Serialize};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub const DEFAULT_CONFIG_FILE: &str = "fleetwatch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
}

/// Load config and apply CLI flag overrides (flags win over everything).
pub fn load(global: &GlobalOpts) -> Result<AppConfig, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = load_from(&path)?;
    if let Some(port) = global.port {
        config.monitor.port = port;
    }
    Ok(config)
}

fn load_from(path: &Path) -> Result<AppConfig, CliError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FLEETWATCH_").split("__"));
    Ok(figment.extract()?)
}
