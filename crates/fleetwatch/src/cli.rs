//! Clap derive structures for the `fleetwatch` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetwatch -- telemetry server and operator console for server fleets
#[derive(Debug, Parser)]
#[command(
    name = "fleetwatch",
    version,
    about = "Monitor a fleet of servers over a plain-text TCP telemetry feed",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the config file
    #[arg(long, short = 'c', env = "FLEETWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Telemetry listen port (overrides config)
    #[arg(long, short = 'p', env = "FLEETWATCH_PORT", global = true)]
    pub port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the headless telemetry ingestion server
    Serve(ServeArgs),
    /// Run the ingestion server with an interactive operator console
    Console(ConsoleArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Directory for the append-only server log
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Skip confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,
}
