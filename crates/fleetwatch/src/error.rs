//! CLI error types with miette diagnostics.

use fleetwatch_ingest::IngestError;
use miette::Diagnostic;
use thiserror::Error;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Could not start the telemetry listener")]
    #[diagnostic(
        code(fleetwatch::listener),
        help(
            "Another process may already hold the port.\n\
             Pick a different one with --port or the listen settings in the config file."
        )
    )]
    Listener(#[source] IngestError),

    #[error("Invalid configuration")]
    #[diagnostic(
        code(fleetwatch::config),
        help("Check the config file and FLEETWATCH_* environment variables.")
    )]
    Config(#[source] Box<figment::Error>),

    #[error("Server task ended unexpectedly")]
    #[diagnostic(code(fleetwatch::server_task))]
    ServerTask,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<IngestError> for CliError {
    fn from(err: IngestError) -> Self {
        Self::Listener(err)
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Listener(_) => exit_code::CONNECTION,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}
