//! # Config Subcommand
//!
//! Loads settings exactly as the server does and prints the effective values.
//! Exits 0 when the settings are valid, 1 when they are not.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use keygate_api::config::Settings;

/// Arguments for the `keygate config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate settings and print the effective values.
    Check,
}

/// Execute the config subcommand.
pub fn run_config(args: &ConfigArgs, config: Option<&Path>) -> Result<u8> {
    match args.command {
        ConfigCommand::Check => {
            let stdout = std::io::stdout();
            check(config, |var| std::env::var(var).ok(), &mut stdout.lock())
        }
    }
}

/// Validate settings, writing either the summary or the failure to `out`.
pub fn check(
    config: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    out: &mut impl Write,
) -> Result<u8> {
    match crate::load_settings_with(config, env) {
        Ok(settings) => {
            write_summary(&settings, out)?;
            writeln!(out, "OK")?;
            Ok(0)
        }
        Err(e) => {
            writeln!(out, "INVALID: {e:#}")?;
            Ok(1)
        }
    }
}

fn write_summary(settings: &Settings, out: &mut impl Write) -> std::io::Result<()> {
    let summary = settings.summary();
    let width = summary.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, value) in summary {
        writeln!(out, "{name:<width$}  {value}")?;
    }
    Ok(())
}
