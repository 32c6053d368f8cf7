//! # keygate CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keygate_cli::config::{run_config, ConfigArgs};
use keygate_cli::counter::{run_counter, CounterArgs};
use keygate_cli::token::{run_token, TokenArgs};

/// Operator tooling for the keygate admission gate.
#[derive(Parser, Debug)]
#[command(name = "keygate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the settings file. Defaults to `KEYGATE_CONFIG`.
    #[arg(long, global = true, env = "KEYGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and print settings.
    Config(ConfigArgs),

    /// Inspect window counters in the shared store.
    Counter(CounterArgs),

    /// Token utilities.
    Token(TokenArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Config(args) => run_config(args, config),
        Commands::Counter(args) => run_counter(args, config),
        Commands::Token(args) => run_token(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
