//! # Counter Subcommand
//!
//! Reads a window counter from the shared Redis store. In-memory counters
//! live inside the server process and cannot be inspected from outside.
//!
//! The Redis URL comes from `--redis-url`, falling back to the loaded
//! settings (`stores.redis` or `REDIS_URL`). The key prefix comes from the
//! settings so the CLI reads the same keys the server writes.

use std::io::Write;
use std::net::IpAddr;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use keygate_core::{ApiToken, KeyKind, RateLimitKey};
use keygate_store::{CounterStore, RedisCounterStore};

/// Arguments for the `keygate counter` subcommand.
#[derive(Args, Debug)]
pub struct CounterArgs {
    #[command(subcommand)]
    pub command: CounterCommand,
}

#[derive(Subcommand, Debug)]
pub enum CounterCommand {
    /// Show the current count and remaining window for one key.
    Show {
        /// Rate-limit key, `token:<value>` or `ip:<addr>`.
        #[arg(value_name = "KEY", value_parser = parse_key)]
        key: RateLimitKey,

        /// Redis URL, overriding the configured counter store.
        #[arg(long)]
        redis_url: Option<String>,
    },
}

/// Parse `token:<value>` or `ip:<addr>` into a [`RateLimitKey`].
pub fn parse_key(raw: &str) -> Result<RateLimitKey, String> {
    if let Some(token) = raw.strip_prefix("token:") {
        let token = ApiToken::new(token);
        if token.is_blank() {
            return Err("token must not be blank".into());
        }
        return Ok(RateLimitKey::for_token(&token));
    }
    if let Some(addr) = raw.strip_prefix("ip:") {
        let addr: IpAddr = addr
            .parse()
            .map_err(|e| format!("invalid address {addr:?}: {e}"))?;
        return Ok(RateLimitKey::for_ip(addr));
    }
    Err("expected token:<value> or ip:<addr>".into())
}

/// Execute the counter subcommand.
pub fn run_counter(args: &CounterArgs, config: Option<&Path>) -> Result<u8> {
    let CounterCommand::Show { key, redis_url } = &args.command;
    let settings = crate::load_settings(config)?;

    let url = match redis_url {
        Some(url) => url.clone(),
        None => match &settings.stores.redis {
            Some(redis) => redis.url(),
            None => bail!(
                "no redis counter store configured; in-memory counters are only visible to the server"
            ),
        },
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let store = RedisCounterStore::connect_with_prefix(&url, &settings.throttle.key_prefix)
            .await
            .context("failed to connect to redis")?;
        let stdout = std::io::stdout();
        show(&store, key, &mut stdout.lock()).await
    })
}

/// Print the counter for `key` as read from `store`.
///
/// Token keys are printed by fingerprint, never by value.
pub async fn show(store: &dyn CounterStore, key: &RateLimitKey, out: &mut impl Write) -> Result<u8> {
    let count = store.get(key.as_str()).await?;
    let ttl = store.time_to_live(key.as_str()).await?;

    let label = match key.kind() {
        KeyKind::Token => {
            let token = key.as_str().strip_prefix("token:").unwrap_or_default();
            format!("token fingerprint {}", ApiToken::new(token).fingerprint())
        }
        KeyKind::Ip => key.as_str().to_string(),
    };

    match count {
        None => writeln!(out, "{label}: no active window")?,
        Some(count) => {
            let remaining = ttl.map_or_else(
                || "no expiry".to_string(),
                |ttl| format!("{}s", ttl.as_secs()),
            );
            writeln!(out, "{label}: count={count} remaining={remaining}")?;
        }
    }
    Ok(0)
}
