//! # Token Subcommand
//!
//! Logs never carry raw tokens, only a short SHA-256 fingerprint. This
//! subcommand computes that fingerprint so an operator can find a client's
//! log lines.

use std::io::Write;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use keygate_core::ApiToken;

/// Arguments for the `keygate token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Print the log fingerprint of a token.
    Fingerprint {
        /// The raw API token.
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

/// Execute the token subcommand.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    match &args.command {
        TokenCommand::Fingerprint { token } => {
            let stdout = std::io::stdout();
            fingerprint(token, &mut stdout.lock())
        }
    }
}

pub fn fingerprint(raw: &str, out: &mut impl Write) -> Result<u8> {
    let token = ApiToken::new(raw);
    if token.is_blank() {
        bail!("token must not be blank");
    }
    writeln!(out, "{}", token.fingerprint())?;
    Ok(0)
}
