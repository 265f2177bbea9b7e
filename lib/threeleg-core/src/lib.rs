//! # Threeleg Core
//!
//! Client side of the OAuth2 authorization code ("three-legged") grant.
//!
//! This crate drives the whole lifecycle of a user-delegated access token:
//! - **[`OAuth2Client::request_access_token`]** - validate a profile, open the
//!   provider consent page on a [`ConsentSurface`], catch the authorization
//!   code and exchange it for tokens
//! - **[`OAuth2Client::refresh_access_token`]** - trade the stored refresh
//!   token for a new access token
//! - **[`OAuth2Client::apply_access_token`]** - place the current token on an
//!   outbound request, as a header, a query parameter or a body fragment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use threeleg_core::{
//!     ConsentListener, ConsentSurface, ConsentSurfaceError, FlowState, OAuth2Client,
//!     OAuth2Profile, SharedOAuth2Profile,
//! };
//! use url::Url;
//!
//! #[derive(Debug)]
//! struct SystemBrowser;
//!
//! impl ConsentSurface for SystemBrowser {
//!     fn open(&self, url: &Url, listener: ConsentListener) -> Result<(), ConsentSurfaceError> {
//!         // Show `url`, then report navigations with `listener.location_changed(...)`
//!         # let _ = (url, listener);
//!         Ok(())
//!     }
//!
//!     fn close(&self) {}
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OAuth2Client::builder()
//!     .with_consent_surface(Arc::new(SystemBrowser))
//!     .build()?;
//!
//! let profile = SharedOAuth2Profile::new(
//!     OAuth2Profile::builder("github")
//!         .with_authorization_uri("https://github.com/login/oauth/authorize")
//!         .with_access_token_uri("https://github.com/login/oauth/access_token")
//!         .with_redirect_uri("http://localhost:8080/callback")
//!         .with_client_id("my-client-id")
//!         .with_client_secret("my-client-secret")
//!         .with_scope("repo")
//!         .build(),
//! );
//!
//! let pending = client.request_access_token(&profile).await?;
//! if pending.wait().await == FlowState::Complete {
//!     println!("authorized");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Redirect URI and consent mode
//!
//! | Redirect URI | Code is read from |
//! |---|---|
//! | `http(s)://...` | the location the provider redirects the surface to |
//! | any URN, e.g. `urn:ietf:wg:oauth:2.0:oob` | the `<title>` of the rendered page |
//!
//! ## Profile values
//!
//! Profile settings may contain `${name}` placeholders. They are expanded by
//! the profile's [`PropertyExpander`] each time a flow starts, so the profile
//! itself keeps the raw values.
//!
//! ## Error Handling
//!
//! - [`OAuth2Error`] - returned by the client operations
//! - [`TokenExchangeError`] - token endpoint failures
//! - [`AuthenticationError`] - token fragments that cannot be built (logged only)
//!
//! Failures that happen after the consent surface opened are not returned:
//! they are logged with `tracing` and reported as the final [`FlowState`] of
//! the [`PendingAuthorization`].
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber. Secrets
//! are redacted from every `Debug` implementation.

mod apply;
mod consent;
mod error;
mod exchange;
mod flow;
mod parameters;
mod profile;
mod secret;

pub use self::apply::{
    ACCESS_TOKEN_PARAM, AUTHORIZATION_HEADER, AuthenticationError, BearerToken, MultiMap,
    OutboundRequest, RequestHeaders, RequestParams, apply_access_token,
};
pub use self::consent::{
    ConsentEvent, ConsentListener, ConsentMode, ConsentSurface, ConsentSurfaceError,
    extract_authorization_code, extract_title,
};
pub use self::error::{InvalidParameters, OAuth2Error, ParameterField};
pub use self::exchange::{TokenExchangeError, TokenExchanger, TokenSet};
pub use self::flow::{
    AbandonReason, DEFAULT_CONSENT_TIMEOUT, FlowState, OAuth2Client, OAuth2ClientBuilder,
    PendingAuthorization,
};
pub use self::parameters::{
    OAuth2Parameters, OOB_URN, RedirectTarget, RefreshParameters, ValidatedParameters,
};
#[cfg(feature = "yaml")]
pub use self::profile::ProfileConfigError;
pub use self::profile::{
    AccessTokenPosition, AccessTokenStatus, NoExpansion, OAuth2Profile, OAuth2ProfileBuilder,
    OAuth2ProfileSettings, PropertyContext, PropertyExpander, SharedOAuth2Profile,
};
pub use self::secret::SecureString;

/// Re-export of the `oauth2` newtypes used in the public API.
pub use oauth2::{AuthUrl, AuthorizationCode, ClientId, RedirectUrl, TokenUrl};
