//! # Route Exemptions
//!
//! Routes listed here bypass authentication. A pattern is either an exact
//! path (`/`) or a prefix ending in `/*` (`/public/*` matches `/public` and
//! everything below it).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid exemption pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Patterns are absolute paths.
    #[error("route pattern must start with '/': {0:?}")]
    NotAbsolute(String),
}

/// A single exemption pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoutePattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches a base path and every path below it.
    Prefix(String),
}

impl RoutePattern {
    /// Parse `/path` or `/path/*`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        }
        Ok(match pattern.strip_suffix("/*") {
            Some(base) => Self::Prefix(base.to_string()),
            None => Self::Exact(pattern.to_string()),
        })
    }

    /// Whether `path` is covered by this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoutePattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoutePattern> for String {
    fn from(pattern: RoutePattern) -> Self {
        pattern.to_string()
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(path) => f.write_str(path),
            Self::Prefix(base) => write!(f, "{base}/*"),
        }
    }
}

/// The set of exempt routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exemptions(Vec<RoutePattern>);

impl Exemptions {
    /// Exempt exactly `patterns`.
    pub fn new(patterns: impl IntoIterator<Item = RoutePattern>) -> Self {
        Self(patterns.into_iter().collect())
    }

    /// No exempt routes.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Whether `path` is exempt.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.0.iter().any(|p| p.matches(path))
    }

    /// The configured patterns.
    pub fn patterns(&self) -> &[RoutePattern] {
        &self.0
    }
}

impl Default for Exemptions {
    /// The public home route.
    fn default() -> Self {
        Self(vec![RoutePattern::Exact("/".to_string())])
    }
}
