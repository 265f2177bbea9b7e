//! Error types for the authorization flow.

use std::fmt;

use crate::exchange::TokenExchangeError;

/// The profile field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterField {
    /// The provider authorization endpoint.
    AuthorizationUri,
    /// The provider token endpoint.
    AccessTokenUri,
    /// The redirect URI (HTTP URL or URN).
    RedirectUri,
    /// The client identifier.
    ClientId,
    /// The client secret.
    ClientSecret,
    /// The stored refresh token.
    RefreshToken,
}

impl ParameterField {
    /// Human-readable label used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::AuthorizationUri => "Authorization URI",
            Self::AccessTokenUri => "Access token URI",
            Self::RedirectUri => "Redirect URI",
            Self::ClientId => "Client ID",
            Self::ClientSecret => "Client secret",
            Self::RefreshToken => "Refresh token",
        }
    }
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation failure on resolved OAuth2 parameters.
///
/// Only the first violation is reported, in the validation order.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
#[display("{message}")]
pub struct InvalidParameters {
    field: ParameterField,
    message: String,
}

impl InvalidParameters {
    pub(crate) fn empty(field: ParameterField) -> Self {
        Self {
            field,
            message: format!("{field} is empty"),
        }
    }

    pub(crate) fn not_http_url(field: ParameterField, value: &str) -> Self {
        Self {
            field,
            message: format!("{field} {value} is not a valid HTTP URL"),
        }
    }

    pub(crate) fn not_http_url_or_urn(field: ParameterField, value: &str) -> Self {
        Self {
            field,
            message: format!("{field} {value} is not a valid HTTP URL or URN"),
        }
    }

    /// The field that failed validation.
    pub fn field(&self) -> ParameterField {
        self.field
    }

    /// The field-specific message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by the OAuth2 client.
///
/// On the interactive path only the variants raised before the consent surface
/// opens ever reach the caller; failures after consent are logged instead.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum OAuth2Error {
    /// Resolved parameters violate a structural or content rule.
    #[display("Invalid OAuth2 parameters: {_0}")]
    InvalidParameters(InvalidParameters),

    /// The authorization URL could not be encoded.
    #[display("Failed to create the authorization URL: {reason}")]
    #[from(skip)]
    UrlConstruction {
        /// Description of the encoding failure.
        reason: String,
    },

    /// The token endpoint rejected the exchange or could not be reached.
    #[display("Token exchange failed: {_0}")]
    TokenExchange(TokenExchangeError),

    /// Another interactive authorization is still waiting for consent on this profile.
    #[display("An authorization flow is already waiting for consent on profile '{profile}'")]
    #[from(skip)]
    AuthorizationPending {
        /// Name of the profile.
        profile: String,
    },

    /// The default HTTP client could not be created.
    #[display("Failed to build the HTTP client: {reason}")]
    #[from(skip)]
    HttpClient {
        /// Description reported by the HTTP stack.
        reason: String,
    },

    /// The consent surface refused to open the authorization URL.
    #[display("Consent surface failed to open: {reason}")]
    #[from(skip)]
    ConsentSurface {
        /// Description of the failure reported by the surface.
        reason: String,
    },
}

impl OAuth2Error {
    /// Returns `true` for a validation failure.
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(self, Self::InvalidParameters(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_empty_field() {
        let error = InvalidParameters::empty(ParameterField::ClientId);
        assert_eq!(error.to_string(), "Client ID is empty");
        assert_eq!(error.field(), ParameterField::ClientId);
    }

    #[test]
    fn should_display_invalid_http_url() {
        let error = InvalidParameters::not_http_url(ParameterField::AuthorizationUri, "ftp://x");
        assert_eq!(
            error.to_string(),
            "Authorization URI ftp://x is not a valid HTTP URL"
        );
    }

    #[test]
    fn should_wrap_invalid_parameters() {
        let error = OAuth2Error::from(InvalidParameters::not_http_url_or_urn(
            ParameterField::RedirectUri,
            "nowhere",
        ));
        assert!(error.is_invalid_parameters());
        assert_eq!(
            error.to_string(),
            "Invalid OAuth2 parameters: Redirect URI nowhere is not a valid HTTP URL or URN"
        );
    }

    #[test]
    fn should_display_pending_authorization() {
        let error = OAuth2Error::AuthorizationPending {
            profile: "github".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "An authorization flow is already waiting for consent on profile 'github'"
        );
    }
}
