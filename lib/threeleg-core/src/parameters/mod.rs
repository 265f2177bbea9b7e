//! Resolved OAuth2 parameters for a single flow.
//!
//! [`OAuth2Parameters::resolve`] snapshots a profile with placeholders
//! expanded. The snapshot is then validated into [`ValidatedParameters`]
//! (authorization code path) or [`RefreshParameters`] (refresh path).

use std::fmt;

use crate::profile::SharedOAuth2Profile;
use crate::secret::SecureString;

mod authorization;

mod validation;
pub use self::validation::{OOB_URN, RedirectTarget, RefreshParameters, ValidatedParameters};

/// Resolved, immutable snapshot of a profile's endpoint and credential values.
///
/// Resolution never fails; a placeholder that cannot be expanded stays in
/// the value and is caught by validation.
#[derive(Clone)]
pub struct OAuth2Parameters {
    profile: SharedOAuth2Profile,
    /// Expanded authorization endpoint.
    pub authorization_uri: String,
    /// Expanded redirect URI.
    pub redirect_uri: String,
    /// Expanded token endpoint.
    pub access_token_uri: String,
    /// Expanded client identifier.
    pub client_id: String,
    /// Expanded client secret.
    pub client_secret: SecureString,
    /// Expanded scope.
    pub scope: String,
}

impl OAuth2Parameters {
    /// Expands every raw profile value against the profile's context.
    pub fn resolve(profile: &SharedOAuth2Profile) -> Self {
        Self {
            profile: profile.clone(),
            authorization_uri: profile.expand(profile.authorization_uri()),
            redirect_uri: profile.expand(profile.redirect_uri()),
            access_token_uri: profile.expand(profile.access_token_uri()),
            client_id: profile.expand(profile.client_id()),
            client_secret: SecureString::new(profile.expand(profile.client_secret().as_str())),
            scope: profile.expand(profile.scope()),
        }
    }

    /// The profile these parameters were resolved from.
    pub fn profile(&self) -> &SharedOAuth2Profile {
        &self.profile
    }
}

impl fmt::Debug for OAuth2Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Parameters")
            .field("profile", &self.profile.name())
            .field("authorization_uri", &self.authorization_uri)
            .field("redirect_uri", &self.redirect_uri)
            .field("access_token_uri", &self.access_token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret)
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{OAuth2Profile, PropertyContext};

    #[test]
    fn should_expand_every_field() {
        let context = PropertyContext::new()
            .with_property("host", "auth.example.com")
            .with_property("id", "my-client")
            .with_property("secret", "my-secret")
            .with_property("scope", "read");
        let profile = SharedOAuth2Profile::new(
            OAuth2Profile::builder("expanded")
                .with_authorization_uri("https://${host}/authorize")
                .with_access_token_uri("https://${host}/token")
                .with_redirect_uri("http://localhost/${host}")
                .with_client_id("${id}")
                .with_client_secret("${secret}")
                .with_scope("${scope} write")
                .with_expander(context)
                .build(),
        );

        let parameters = OAuth2Parameters::resolve(&profile);

        assert_eq!(
            parameters.authorization_uri,
            "https://auth.example.com/authorize"
        );
        assert_eq!(parameters.access_token_uri, "https://auth.example.com/token");
        assert_eq!(parameters.redirect_uri, "http://localhost/auth.example.com");
        assert_eq!(parameters.client_id, "my-client");
        assert!(parameters.client_secret.equals_str("my-secret"));
        assert_eq!(parameters.scope, "read write");
        assert_eq!(parameters.profile().name(), "expanded");
    }

    #[test]
    fn should_keep_unresolved_placeholders() {
        let profile = SharedOAuth2Profile::new(
            OAuth2Profile::builder("raw")
                .with_authorization_uri("${missing}/authorize")
                .build(),
        );

        let parameters = OAuth2Parameters::resolve(&profile);

        assert_eq!(parameters.authorization_uri, "${missing}/authorize");
    }

    #[test]
    fn should_redact_secret_in_debug() {
        let profile = SharedOAuth2Profile::new(
            OAuth2Profile::builder("debug")
                .with_client_secret("top-secret-value")
                .build(),
        );

        let debug_str = format!("{:?}", OAuth2Parameters::resolve(&profile));

        assert!(!debug_str.contains("top-secret-value"));
    }
}
