use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::TokenExchangeError;
use crate::secret::SecureString;

/// Tokens returned by the provider token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    access_token: SecureString,
    refresh_token: Option<SecureString>,
    token_type: Option<String>,
    expires_in: Option<Duration>,
    scope: Option<String>,
}

impl TokenSet {
    /// Creates a token set with an access token and an optional refresh token.
    pub fn new(
        access_token: impl Into<SecureString>,
        refresh_token: Option<SecureString>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_type: None,
            expires_in: None,
            scope: None,
        }
    }

    /// The new access token.
    pub fn access_token(&self) -> &SecureString {
        &self.access_token
    }

    /// The refresh token, when the provider issued or rotated one.
    pub fn refresh_token(&self) -> Option<&SecureString> {
        self.refresh_token.as_ref()
    }

    /// The token type reported by the provider, usually `Bearer`.
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Lifetime of the access token, if reported.
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// Granted scope, if it differs from the requested one.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Successful token response (RFC 6749 §5.1).
///
/// `token_type` is optional here: some providers omit it.
#[derive(Deserialize)]
pub(super) struct TokenResponseBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponseBody {
    pub(super) fn into_token_set(self) -> Result<TokenSet, TokenExchangeError> {
        let access_token = self
            .access_token
            .map(SecureString::new)
            .filter(|token| !token.is_blank())
            .ok_or(TokenExchangeError::MissingAccessToken)?;
        let refresh_token = self
            .refresh_token
            .map(SecureString::new)
            .filter(|token| !token.is_blank());

        Ok(TokenSet {
            access_token,
            refresh_token,
            token_type: self.token_type,
            expires_in: self.expires_in.map(Duration::from_secs),
            scope: self.scope,
        })
    }
}

/// Error response (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponseBody {
    pub(super) error: String,
    #[serde(default)]
    pub(super) error_description: Option<String>,
}
