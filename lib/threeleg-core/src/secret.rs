use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Client secret, access token or refresh token.
///
/// The buffer is wiped on drop, `Debug` never shows the value and `Display`
/// keeps only its first and last four characters. Serializes as the plain
/// string so profiles can be persisted.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps a credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The credential itself, for the few places that must send it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace only; treated as "no credential" everywhere.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Compares with a plain value without exposing the credential.
    pub fn equals_str(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Masks on char boundaries; values of eight characters or less are hidden.
fn masked(value: &str) -> String {
    const VISIBLE: usize = 4;
    let count = value.chars().count();
    if count <= 2 * VISIBLE {
        return "***".to_string();
    }
    let head = value.chars().take(VISIBLE).collect::<String>();
    let tail = value.chars().skip(count - VISIBLE).collect::<String>();
    format!("{head}...{tail}")
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&masked(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
