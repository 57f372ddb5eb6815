//! ClawDBot relay entry point.
//!
//! Binary name: `clawdbot`
//!
//! Parses CLI arguments, loads configuration, wires the relay services, then
//! dispatches to the command handler. `serve` and `console` exit with the
//! code of the recorded lifecycle intent so a process supervisor can tell a
//! restart from a shutdown.

mod cli;
mod http;
mod state;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;
use clap_complete::generate;

use clawdbot_core::lifecycle::Lifecycle;
use clawdbot_infra::config::load_settings;
use clawdbot_observe::tracing_setup::{
    LogFormat, filter_for_verbosity, init_tracing, shutdown_tracing,
};
use clawdbot_types::command::ExitIntent;
use clawdbot_types::message::Principal;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), format, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let code = match cli.command {
        // Shell completions don't need configuration
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "clawdbot", &mut std::io::stdout());
            0
        }

        Commands::CheckConfig => {
            let settings = load_settings(cli.config.as_deref()).await?;
            cli::config_check::check_config(&settings, cli.json)?;
            0
        }

        Commands::Probe => {
            let settings = load_settings(cli.config.as_deref()).await?;
            let state = AppState::init(settings)?;
            if cli::probe::probe(&state, cli.json).await? {
                0
            } else {
                1
            }
        }

        Commands::Serve => {
            let settings = load_settings(cli.config.as_deref()).await?;
            let state = AppState::init(settings)?;
            tokio::spawn(watch_signals(Arc::clone(&state.lifecycle)));
            cli::serve::serve(state, cli.quiet).await?
        }

        Commands::Console { principal } => {
            let settings = load_settings(cli.config.as_deref()).await?;
            let state = AppState::init(settings)?;
            tokio::spawn(watch_signals(Arc::clone(&state.lifecycle)));
            cli::console::console(state, Principal::from(principal), cli.quiet).await?
        }
    };

    shutdown_tracing();
    if code != 0 {
        tracing::info!(code, "Exiting");
        std::process::exit(code);
    }
    Ok(())
}

/// Turn Ctrl+C or SIGTERM into a shutdown intent.
async fn watch_signals(lifecycle: Arc<Lifecycle>) {
    tokio::select! {
        _ = shutdown_signal() => {
            lifecycle.request(ExitIntent::Shutdown);
        }
        _ = lifecycle.cancelled() => {}
    }
}

/// Wait for Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires, leaving the
/// other signal and the lifecycle commands to stop the process.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
