use std::fmt;

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, RefreshToken, TokenUrl};
use url::Url;

use super::OAuth2Parameters;
use crate::consent::ConsentMode;
use crate::error::{InvalidParameters, ParameterField};
use crate::profile::SharedOAuth2Profile;

/// The out-of-band redirect sentinel: the code is shown to the user instead of
/// being sent to a redirect URL.
pub const OOB_URN: &str = "urn:ietf:wg:oauth:2.0:oob";

/// A validated redirect URI.
#[derive(Debug, Clone)]
pub enum RedirectTarget {
    /// The provider redirects the consent surface to this URL with the code
    /// in the query string.
    Http(RedirectUrl),
    /// No real redirect happens; the code appears in the rendered page.
    Urn(String),
}

impl RedirectTarget {
    /// The redirect URI as sent to the provider.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http(url) => url.as_str(),
            Self::Urn(urn) => urn,
        }
    }

    /// Returns `true` for the literal out-of-band sentinel.
    pub fn is_oob_sentinel(&self) -> bool {
        matches!(self, Self::Urn(urn) if urn == OOB_URN)
    }

    /// Which consent surface events carry the authorization code.
    pub fn consent_mode(&self) -> ConsentMode {
        match self {
            Self::Http(_) => ConsentMode::Location,
            Self::Urn(_) => ConsentMode::Content,
        }
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters that passed validation for the authorization code flow.
#[derive(Debug, Clone)]
pub struct ValidatedParameters {
    pub(crate) profile: SharedOAuth2Profile,
    pub(crate) auth_url: AuthUrl,
    pub(crate) token_url: TokenUrl,
    pub(crate) redirect: RedirectTarget,
    pub(crate) client_id: ClientId,
    pub(crate) client_secret: ClientSecret,
    pub(crate) scope: String,
}

impl ValidatedParameters {
    /// The profile these parameters were resolved from.
    pub fn profile(&self) -> &SharedOAuth2Profile {
        &self.profile
    }

    /// The provider authorization endpoint.
    pub fn auth_url(&self) -> &AuthUrl {
        &self.auth_url
    }

    /// The provider token endpoint.
    pub fn token_url(&self) -> &TokenUrl {
        &self.token_url
    }

    /// The validated redirect URI.
    pub fn redirect(&self) -> &RedirectTarget {
        &self.redirect
    }

    /// The client identifier.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The requested scope, possibly empty.
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

/// Parameters that passed validation for the refresh token flow.
#[derive(Debug, Clone)]
pub struct RefreshParameters {
    pub(crate) profile: SharedOAuth2Profile,
    pub(crate) token_url: TokenUrl,
    pub(crate) client_id: ClientId,
    pub(crate) client_secret: ClientSecret,
    pub(crate) refresh_token: RefreshToken,
}

impl RefreshParameters {
    /// The profile these parameters were resolved from.
    pub fn profile(&self) -> &SharedOAuth2Profile {
        &self.profile
    }

    /// The provider token endpoint.
    pub fn token_url(&self) -> &TokenUrl {
        &self.token_url
    }
}

impl OAuth2Parameters {
    /// Validates the parameters for the authorization code flow.
    ///
    /// Checks, in order: authorization URI, access token URI, redirect URI,
    /// client ID, client secret. The first violation is returned.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameters`] naming the offending field.
    pub fn validate(&self) -> Result<ValidatedParameters, InvalidParameters> {
        let auth_url = parse_http_url(&self.authorization_uri)
            .map(AuthUrl::from_url)
            .ok_or_else(|| {
                InvalidParameters::not_http_url(
                    ParameterField::AuthorizationUri,
                    &self.authorization_uri,
                )
            })?;
        let token_url = self.validate_token_url()?;
        let redirect = self.validate_redirect_uri()?;
        let client_id = self.validate_client_id()?;
        let client_secret = self.validate_client_secret()?;

        Ok(ValidatedParameters {
            profile: self.profile.clone(),
            auth_url,
            token_url,
            redirect,
            client_id,
            client_secret,
            scope: self.scope.clone(),
        })
    }

    /// Validates the parameters for the refresh token flow.
    ///
    /// Only the refresh token, client ID, client secret and access token URI
    /// are required, checked in that order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidParameters`] naming the offending field.
    pub fn validate_for_refresh(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<RefreshParameters, InvalidParameters> {
        let refresh_token = refresh_token
            .filter(|token| has_content(token))
            .map(|token| RefreshToken::new(token.to_string()))
            .ok_or_else(|| InvalidParameters::empty(ParameterField::RefreshToken))?;
        let client_id = self.validate_client_id()?;
        let client_secret = self.validate_client_secret()?;
        let token_url = self.validate_token_url()?;

        Ok(RefreshParameters {
            profile: self.profile.clone(),
            token_url,
            client_id,
            client_secret,
            refresh_token,
        })
    }

    fn validate_token_url(&self) -> Result<TokenUrl, InvalidParameters> {
        parse_http_url(&self.access_token_uri)
            .map(TokenUrl::from_url)
            .ok_or_else(|| {
                InvalidParameters::not_http_url(
                    ParameterField::AccessTokenUri,
                    &self.access_token_uri,
                )
            })
    }

    fn validate_redirect_uri(&self) -> Result<RedirectTarget, InvalidParameters> {
        let redirect_uri = &self.redirect_uri;
        if !has_content(redirect_uri) {
            return Err(InvalidParameters::empty(ParameterField::RedirectUri));
        }
        // providers compare redirect_uri byte for byte, keep the resolved text
        let http = parse_http_url(redirect_uri)
            .and_then(|_| RedirectUrl::new(redirect_uri.clone()).ok());
        if let Some(url) = http {
            return Ok(RedirectTarget::Http(url));
        }
        if is_valid_urn(redirect_uri) {
            return Ok(RedirectTarget::Urn(redirect_uri.clone()));
        }
        Err(InvalidParameters::not_http_url_or_urn(
            ParameterField::RedirectUri,
            redirect_uri,
        ))
    }

    fn validate_client_id(&self) -> Result<ClientId, InvalidParameters> {
        if has_content(&self.client_id) {
            Ok(ClientId::new(self.client_id.clone()))
        } else {
            Err(InvalidParameters::empty(ParameterField::ClientId))
        }
    }

    fn validate_client_secret(&self) -> Result<ClientSecret, InvalidParameters> {
        if self.client_secret.is_blank() {
            Err(InvalidParameters::empty(ParameterField::ClientSecret))
        } else {
            Ok(ClientSecret::new(self.client_secret.as_str().to_string()))
        }
    }
}

fn has_content(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Parses an absolute `http` or `https` URL with a host.
fn parse_http_url(value: &str) -> Option<Url> {
    if !has_content(value) {
        return None;
    }
    Url::parse(value)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

fn is_valid_urn(value: &str) -> bool {
    value.starts_with("urn:") && Url::parse(value).is_ok()
}
