use clap::Parser;
use tagsync::cancel::CancelSignal;
use tagsync::cli::{execute_command, Cli};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("tagsync started with verbosity level: {}", cli.verbose);

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current step and cancelling the rest");
            on_interrupt.cancel();
        }
    });

    match execute_command(cli.command, cancel).await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
