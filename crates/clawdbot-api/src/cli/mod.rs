//! CLI command definitions for the `clawdbot` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` is the production
//! workflow; the other commands help operators check a deployment.

pub mod config_check;
pub mod console;
pub mod probe;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Relay chat messages to a local LLM with automatic cloud fallback.
#[derive(Parser)]
#[command(name = "clawdbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// TOML config file; environment variables override its values.
    #[arg(long, global = true, env = "CLAWDBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay: HTTP surface, periodic health probes, graceful drain.
    Serve,

    /// Chat through the relay from stdin/stdout.
    Console {
        /// Principal id to send as; must be in the allowed list.
        #[arg(long)]
        principal: String,
    },

    /// Probe every configured provider once and print the results.
    Probe,

    /// Validate the configuration and print it with secrets redacted.
    CheckConfig,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
