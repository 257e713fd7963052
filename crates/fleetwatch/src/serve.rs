//! `serve` and `console` command handlers.

use fleetwatch_core::Monitor;
use fleetwatch_ingest::IngestServer;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::{ConsoleArgs, GlobalOpts};
use crate::config;
use crate::console::Console;
use crate::error::CliError;

/// Headless telemetry server; runs until Ctrl-C.
pub async fn serve(global: &GlobalOpts) -> Result<(), CliError> {
    let config = config::load(global)?;
    let monitor = Monitor::new(&config.monitor);
    let server = IngestServer::bind(&config.monitor, monitor).await?;
    let cancel = CancellationToken::new();
    let task = tokio::spawn(server.run(cancel.clone()));

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    cancel.cancel();
    task.await.map_err(|_| CliError::ServerTask)??;
    Ok(())
}

/// Telemetry server plus the interactive console on stdin. The console
/// loop is blocking (the monitor facade is synchronous), so it runs on a
/// blocking task while the server owns the async side.
pub async fn console(args: &ConsoleArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = config::load(global)?;
    let monitor = Monitor::new(&config.monitor);
    let server = IngestServer::bind(&config.monitor, monitor.clone()).await?;
    let cancel = CancellationToken::new();
    let server_task = tokio::spawn(server.run(cancel.clone()));

    let repl = Console::new(monitor, args.yes);
    let repl_task = tokio::task::spawn_blocking(move || repl.run());
    repl_task.await.map_err(|_| CliError::ServerTask)??;

    cancel.cancel();
    server_task.await.map_err(|_| CliError::ServerTask)??;
    Ok(())
}
