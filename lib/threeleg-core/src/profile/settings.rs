use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AccessTokenPosition, NoExpansion, OAuth2Profile, PropertyExpander};
use crate::secret::SecureString;

/// Serializable profile configuration.
///
/// Values are raw: they may contain `${name}` placeholders that are expanded
/// when a flow resolves its parameters.
///
/// ```rust
/// use threeleg_core::{AccessTokenPosition, OAuth2ProfileSettings};
///
/// let settings: OAuth2ProfileSettings = serde_json::from_str(r#"{
///     "authorization_uri": "https://auth.example.com/authorize",
///     "access_token_uri": "https://auth.example.com/token",
///     "redirect_uri": "urn:ietf:wg:oauth:2.0:oob",
///     "client_id": "my-client",
///     "client_secret": "my-secret",
///     "access_token_position": "query"
/// }"#)?;
///
/// assert_eq!(settings.access_token_position, AccessTokenPosition::Query);
/// let profile = settings.into_profile("example");
/// assert_eq!(profile.client_id(), "my-client");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2ProfileSettings {
    /// Provider authorization endpoint.
    pub authorization_uri: String,
    /// Redirect URI registered with the provider, or an out-of-band URN.
    pub redirect_uri: String,
    /// Provider token endpoint.
    pub access_token_uri: String,
    /// Client identifier.
    pub client_id: String,
    /// Client secret.
    pub client_secret: SecureString,
    /// Requested scope, space separated.
    pub scope: String,
    /// Current access token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<SecureString>,
    /// Current refresh token, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SecureString>,
    /// Where the access token goes on outbound requests.
    pub access_token_position: AccessTokenPosition,
}

impl OAuth2ProfileSettings {
    /// Builds a profile without placeholder expansion.
    pub fn into_profile(self, name: impl Into<String>) -> OAuth2Profile {
        OAuth2Profile::from_parts(name.into(), self, Arc::new(NoExpansion))
    }

    /// Builds a profile whose placeholders expand against `expander`.
    pub fn into_profile_with(
        self,
        name: impl Into<String>,
        expander: Arc<dyn PropertyExpander>,
    ) -> OAuth2Profile {
        OAuth2Profile::from_parts(name.into(), self, expander)
    }
}

/// Error raised when profile settings cannot be read.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum ProfileConfigError {
    /// The YAML document does not describe a profile.
    #[display("Invalid profile YAML: {message}")]
    Yaml {
        /// Parser message.
        message: String,
    },
}

#[cfg(feature = "yaml")]
impl OAuth2ProfileSettings {
    /// Reads settings from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileConfigError::Yaml`] when the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileConfigError> {
        serde_saphyr::from_str(yaml).map_err(|err| ProfileConfigError::Yaml {
            message: err.to_string(),
        })
    }

    /// Writes settings, tokens included, as a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileConfigError::Yaml`] when serialization fails.
    pub fn to_yaml(&self) -> Result<String, ProfileConfigError> {
        serde_saphyr::to_string(self).map_err(|err| ProfileConfigError::Yaml {
            message: err.to_string(),
        })
    }
}

/// Builder for [`OAuth2Profile`].
#[derive(Debug, Clone)]
pub struct OAuth2ProfileBuilder {
    name: String,
    settings: OAuth2ProfileSettings,
    expander: Arc<dyn PropertyExpander>,
}

impl OAuth2ProfileBuilder {
    /// Creates a builder with empty settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: OAuth2ProfileSettings::default(),
            expander: Arc::new(NoExpansion),
        }
    }

    /// Sets the authorization endpoint.
    #[must_use]
    pub fn with_authorization_uri(mut self, uri: impl Into<String>) -> Self {
        self.settings.authorization_uri = uri.into();
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.settings.redirect_uri = uri.into();
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn with_access_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.settings.access_token_uri = uri.into();
        self
    }

    /// Sets the client identifier.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.settings.client_id = client_id.into();
        self
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<SecureString>) -> Self {
        self.settings.client_secret = secret.into();
        self
    }

    /// Sets the requested scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.settings.scope = scope.into();
        self
    }

    /// Sets an access token obtained elsewhere.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<SecureString>) -> Self {
        self.settings.access_token = Some(token.into());
        self
    }

    /// Sets a refresh token obtained elsewhere.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<SecureString>) -> Self {
        self.settings.refresh_token = Some(token.into());
        self
    }

    /// Sets where the access token goes on outbound requests.
    #[must_use]
    pub fn with_access_token_position(mut self, position: AccessTokenPosition) -> Self {
        self.settings.access_token_position = position;
        self
    }

    /// Sets the placeholder expander.
    #[must_use]
    pub fn with_expander(mut self, expander: impl PropertyExpander + 'static) -> Self {
        self.expander = Arc::new(expander);
        self
    }

    /// Builds the profile.
    pub fn build(self) -> OAuth2Profile {
        OAuth2Profile::from_parts(self.name, self.settings, self.expander)
    }
}
