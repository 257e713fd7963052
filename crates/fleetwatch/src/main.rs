mod cli;
mod config;
mod console;
mod error;
mod output;
mod serve;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The appender guard must outlive all logging.
    let _guard = init_tracing(&cli);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Console-mode stderr logging is kept quiet so the REPL stays readable;
/// `serve` additionally appends every event to a file in `--log-dir`.
fn init_tracing(cli: &Cli) -> Option<WorkerGuard> {
    let level = if cli.global.quiet {
        "error"
    } else {
        match (&cli.command, cli.global.verbose) {
            (Command::Console(_), 0) => "error",
            (_, 0) => "info",
            (_, 1) => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Command::Serve(args) = &cli.command {
        let appender = tracing_appender::rolling::never(&args.log_dir, "fleetwatch.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        None
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve(_) => serve::serve(&cli.global).await,
        Command::Console(ref args) => serve::console(args, &cli.global).await,
    }
}
