//! # keygate-cli: Operator Tooling
//!
//! Provides the `keygate` command-line interface.
//!
//! ## Subcommands
//!
//! - `keygate config check`: Load and validate settings, print the
//!   effective values with credentials redacted.
//! - `keygate counter show`: Read a live window counter and its remaining
//!   time from the Redis counter store.
//! - `keygate token fingerprint`: Print the log fingerprint of a token, for
//!   matching log lines to a principal.
//!
//! ```bash
//! keygate config check --config keygate.yaml
//! keygate counter show token:abc123 --redis-url redis://localhost:6379/0
//! keygate token fingerprint abc123
//! ```

pub mod config;
pub mod counter;
pub mod token;

use std::path::Path;

use anyhow::{Context, Result};
use keygate_api::config::Settings;

/// Load settings from `path` (or defaults) with process environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings_with(path, |var| std::env::var(var).ok())
}

/// Load settings with an explicit environment lookup.
pub fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    Settings::load_from(path, env).with_context(|| match path {
        Some(path) => format!("failed to load settings from {}", path.display()),
        None => "failed to load settings from the environment".to_string(),
    })
}
