use serde::Serialize;
use url::Url;

use super::ValidatedParameters;
use crate::error::OAuth2Error;

/// Query of an authorization request (RFC 6749 §4.1.1).
#[derive(Debug, Serialize)]
struct AuthorizationRequest<'a> {
    response_type: &'static str,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    redirect_uri: &'a str,
}

impl ValidatedParameters {
    /// Builds the provider authorization URL the consent surface opens.
    ///
    /// The request parameters are appended after any query already present on
    /// the authorization endpoint. An empty scope is omitted.
    ///
    /// # Errors
    ///
    /// Returns [`OAuth2Error::UrlConstruction`] if the query cannot be encoded.
    pub fn authorization_url(&self) -> Result<Url, OAuth2Error> {
        let request = AuthorizationRequest {
            response_type: "code",
            client_id: self.client_id.as_str(),
            scope: Some(self.scope.as_str()).filter(|scope| !scope.trim().is_empty()),
            redirect_uri: self.redirect.as_str(),
        };
        let encoded =
            serde_urlencoded::to_string(&request).map_err(|err| OAuth2Error::UrlConstruction {
                reason: err.to_string(),
            })?;

        let mut url = self.auth_url.url().clone();
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded,
        };
        url.set_query(Some(&query));
        Ok(url)
    }
}
