//! Token endpoint client.
//!
//! Both grants POST an `application/x-www-form-urlencoded` body carrying the
//! client credentials (RFC 6749 §2.3.1 body form) and read a JSON response.

use std::time::Duration;

use http::header::{ACCEPT, CONTENT_TYPE};
use oauth2::{AuthorizationCode, TokenUrl};
use serde::Serialize;
use tracing::debug;

use crate::parameters::{RefreshParameters, ValidatedParameters};

mod token;
use self::token::{ErrorResponseBody, TokenResponseBody};
pub use self::token::TokenSet;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Failure while exchanging a code or refresh token.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum TokenExchangeError {
    /// The token endpoint answered with an OAuth2 error.
    #[display("Token endpoint rejected the request (HTTP {status}): {error}")]
    Rejected {
        /// HTTP status of the response.
        status: u16,
        /// OAuth2 error code, such as `invalid_grant`.
        error: String,
        /// Optional human-readable description.
        description: Option<String>,
    },

    /// The request form could not be encoded.
    #[display("Cannot encode the token request: {reason}")]
    InvalidRequest {
        /// Encoder error description.
        reason: String,
    },

    /// The token endpoint could not be reached.
    #[display("Failed to reach the token endpoint: {reason}")]
    Network {
        /// Transport error description.
        reason: String,
    },

    /// The response body is not a token response.
    #[display("Invalid token response: {reason}")]
    InvalidResponse {
        /// Parser error description.
        reason: String,
    },

    /// The response has no usable access token.
    #[display("Token response does not contain an access token")]
    MissingAccessToken,
}

impl From<reqwest::Error> for TokenExchangeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
enum TokenRequest<'a> {
    AuthorizationCode {
        client_id: &'a str,
        client_secret: &'a str,
        redirect_uri: &'a str,
        code: &'a str,
    },
    RefreshToken {
        client_id: &'a str,
        client_secret: &'a str,
        refresh_token: &'a str,
    },
}

impl TokenRequest<'_> {
    fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

/// Posts token requests to the provider token endpoint.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl TokenExchanger {
    /// Creates an exchanger on top of an HTTP client.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    /// Bounds every token request by `timeout`.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TokenExchangeError`] if the endpoint cannot be reached,
    /// rejects the code or answers without an access token.
    pub async fn exchange_code(
        &self,
        parameters: &ValidatedParameters,
        code: &AuthorizationCode,
    ) -> Result<TokenSet, TokenExchangeError> {
        let request = TokenRequest::AuthorizationCode {
            client_id: parameters.client_id.as_str(),
            client_secret: parameters.client_secret.secret(),
            redirect_uri: parameters.redirect.as_str(),
            code: code.secret(),
        };
        self.post(&parameters.token_url, &request).await
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenExchangeError`] if the endpoint cannot be reached,
    /// rejects the refresh token or answers without an access token.
    pub async fn exchange_refresh_token(
        &self,
        parameters: &RefreshParameters,
    ) -> Result<TokenSet, TokenExchangeError> {
        let request = TokenRequest::RefreshToken {
            client_id: parameters.client_id.as_str(),
            client_secret: parameters.client_secret.secret(),
            refresh_token: parameters.refresh_token.secret(),
        };
        self.post(&parameters.token_url, &request).await
    }

    async fn post(
        &self,
        token_url: &TokenUrl,
        request: &TokenRequest<'_>,
    ) -> Result<TokenSet, TokenExchangeError> {
        let body = serde_urlencoded::to_string(request).map_err(|err| {
            TokenExchangeError::InvalidRequest {
                reason: err.to_string(),
            }
        })?;

        debug!(
            token_url = token_url.as_str(),
            grant_type = request.grant_type(),
            "sending token request"
        );
        let mut builder = self
            .client
            .post(token_url.url().clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(body);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), "token endpoint responded");

        parse_token_response(status, &text)
    }
}

fn parse_token_response(
    status: http::StatusCode,
    text: &str,
) -> Result<TokenSet, TokenExchangeError> {
    if let Ok(error) = serde_json::from_str::<ErrorResponseBody>(text) {
        return Err(TokenExchangeError::Rejected {
            status: status.as_u16(),
            error: error.error,
            description: error.error_description,
        });
    }
    if !status.is_success() {
        return Err(TokenExchangeError::Rejected {
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            description: Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        });
    }

    serde_json::from_str::<TokenResponseBody>(text)
        .map_err(|err| TokenExchangeError::InvalidResponse {
            reason: err.to_string(),
        })?
        .into_token_set()
}
