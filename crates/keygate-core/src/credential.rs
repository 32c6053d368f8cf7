//! # Authorization Header Grammar
//!
//! Parses `Authorization` values of the form
//!
//! ```text
//! Token token="abc123", nonce="def"
//! Token abc123
//! Bearer abc123
//! ```
//!
//! The scheme prefix is `Token` or `Bearer` followed by whitespace. The rest
//! is a list of `key=value` pairs separated by `,`, `;` or runs of tabs. When
//! the first pair does not start with `token=`, the whole first pair is the
//! token. One pair of surrounding double quotes is stripped from each value.

use std::collections::BTreeMap;

use crate::error::AuthError;
use crate::token::ApiToken;

/// Accepted credential schemes.
const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Prefix of the pair carrying the token.
const TOKEN_PREFIX: &str = "token=";

/// A parsed `Authorization` credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: ApiToken,
    options: BTreeMap<String, String>,
}

impl Credential {
    /// Parse an `Authorization` header value.
    ///
    /// Returns [`AuthError::Missing`] for unknown schemes, a scheme with
    /// nothing after it, or a blank token.
    pub fn parse(header: &str) -> Result<Self, AuthError> {
        let raw = strip_scheme(header).ok_or(AuthError::Missing)?;
        let mut parts = split_pairs(raw).into_iter();

        // A first part without the `token=` key is the token itself.
        let first = parts.next().unwrap_or_default();
        let token = first.strip_prefix(TOKEN_PREFIX).unwrap_or(first);
        let token = ApiToken::new(unquote(token));
        if token.is_blank() {
            return Err(AuthError::Missing);
        }

        let options = parts
            .map(split_pair)
            .map(|(key, value)| (key, unquote(&value).to_string()))
            .collect();

        Ok(Self { token, options })
    }

    /// Parse an optional header, treating absence as [`AuthError::Missing`].
    pub fn from_header(header: Option<&str>) -> Result<Self, AuthError> {
        header.ok_or(AuthError::Missing).and_then(Self::parse)
    }

    /// The presented token.
    pub fn token(&self) -> &ApiToken {
        &self.token
    }

    /// Consume the credential, returning the token.
    pub fn into_token(self) -> ApiToken {
        self.token
    }

    /// Additional `key=value` options that followed the token.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

/// Remove the scheme and the whitespace after it.
fn strip_scheme(header: &str) -> Option<&str> {
    SCHEMES.iter().find_map(|scheme| {
        let rest = header.strip_prefix(scheme)?;
        let trimmed = rest.trim_start();
        // At least one whitespace character must follow the scheme.
        (trimmed.len() < rest.len()).then_some(trimmed)
    })
}

/// Split on `,`, `;` or a run of tabs, trimming whitespace around each part.
///
/// Trailing empty parts are dropped.
fn split_pairs(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b',' | b';' => {
                parts.push(raw[start..i].trim());
                i += 1;
                start = i;
            }
            b'\t' => {
                parts.push(raw[start..i].trim());
                while i < bytes.len() && bytes[i] == b'\t' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(raw[start..].trim());

    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

/// Split `key=value` at the first `=`. A part without `=` has an empty value.
fn split_pair(part: &str) -> (String, String) {
    match part.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (part.to_string(), String::new()),
    }
}

/// Strip one leading and one trailing double quote.
fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
