use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;

use super::{DEFAULT_CONSENT_TIMEOUT, OAuth2Client};
use crate::consent::ConsentSurface;
use crate::error::OAuth2Error;
use crate::exchange::TokenExchanger;

/// Builder for [`OAuth2Client`].
///
/// ```rust
/// use std::time::Duration;
/// use threeleg_core::OAuth2Client;
///
/// let client = OAuth2Client::builder()
///     .with_request_timeout(Duration::from_secs(30))
///     .with_consent_timeout(None)
///     .build()?;
/// # Ok::<(), threeleg_core::OAuth2Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct OAuth2ClientBuilder {
    http_client: Option<reqwest::Client>,
    request_timeout: Option<Duration>,
    consent_surface: Option<Arc<dyn ConsentSurface>>,
    consent_timeout: Option<Duration>,
}

impl Default for OAuth2ClientBuilder {
    fn default() -> Self {
        Self {
            http_client: None,
            request_timeout: None,
            consent_surface: None,
            consent_timeout: Some(DEFAULT_CONSENT_TIMEOUT),
        }
    }
}

impl OAuth2ClientBuilder {
    /// Uses a preconfigured HTTP client for token requests.
    ///
    /// Proxies, TLS and redirect policy are then up to that client. The
    /// default client does not follow redirects.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Bounds every token endpoint request.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the surface interactive flows open the authorization URL on.
    #[must_use]
    pub fn with_consent_surface(mut self, surface: Arc<dyn ConsentSurface>) -> Self {
        self.consent_surface = Some(surface);
        self
    }

    /// Sets how long an interactive flow waits for consent; `None` waits forever.
    ///
    /// Defaults to [`DEFAULT_CONSENT_TIMEOUT`].
    #[must_use]
    pub fn with_consent_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.consent_timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`OAuth2Error::HttpClient`] if the default HTTP client cannot be
    /// created.
    pub fn build(self) -> Result<OAuth2Client, OAuth2Error> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .redirect(Policy::none())
                .build()
                .map_err(|err| OAuth2Error::HttpClient {
                    reason: err.to_string(),
                })?,
        };

        let mut exchanger = TokenExchanger::new(http_client);
        if let Some(timeout) = self.request_timeout {
            exchanger = exchanger.with_request_timeout(timeout);
        }

        Ok(OAuth2Client {
            exchanger,
            consent_surface: self.consent_surface,
            consent_timeout: self.consent_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wait_ten_minutes_by_default() {
        let builder = OAuth2ClientBuilder::default();

        assert_eq!(builder.consent_timeout, Some(Duration::from_secs(600)));
        assert!(builder.consent_surface.is_none());
    }

    #[test]
    fn should_build_without_consent_surface() {
        let client = OAuth2Client::builder()
            .with_consent_timeout(None)
            .build()
            .expect("client");

        assert!(client.consent_surface.is_none());
        assert_eq!(client.consent_timeout, None);
    }
}
