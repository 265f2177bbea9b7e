//! Authorization flows driven by [`OAuth2Client`].
//!
//! The interactive flow walks through:
//!
//! ```text
//! Idle -> ParametersBuilt -> Validated -> AuthorizationUrlReady -> AwaitingConsent
//!      -> CodeExtracted -> Exchanging -> Complete
//! ```
//!
//! Everything up to `AwaitingConsent` runs in [`OAuth2Client::request_access_token`]
//! and its failures are returned. The rest runs on a spawned task: failures
//! there are logged and end in [`FlowState::Error`] or [`FlowState::Abandoned`].
//!
//! The refresh flow (`Idle -> ParametersBuilt -> Validated -> Exchanging -> Complete`)
//! runs entirely in [`OAuth2Client::refresh_access_token`] and returns its failures.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tracing::{debug, error, info};

use crate::apply::{self, OutboundRequest};
use crate::consent::{ConsentListener, ConsentSurface};
use crate::error::OAuth2Error;
use crate::exchange::{TokenExchangeError, TokenExchanger};
use crate::parameters::OAuth2Parameters;
use crate::profile::{AccessTokenStatus, SharedOAuth2Profile};
use crate::secret::SecureString;

mod builder;
pub use self::builder::OAuth2ClientBuilder;

mod consent;
use self::consent::ConsentTask;

mod pending;
pub use self::pending::PendingAuthorization;

/// Default bound on the time spent waiting for the user's consent.
pub const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Why an interactive flow stopped before obtaining a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbandonReason {
    /// The surface was closed, or dropped its listener.
    SurfaceClosed,
    /// [`PendingAuthorization::cancel`] was called.
    Cancelled,
    /// No code arrived before the consent timeout.
    TimedOut,
}

/// Progress of an authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing happened yet.
    Idle,
    /// Profile values are resolved.
    ParametersBuilt,
    /// Resolved values passed validation.
    Validated,
    /// The authorization URL is built.
    AuthorizationUrlReady,
    /// The consent surface is open.
    AwaitingConsent,
    /// An authorization code was found.
    CodeExtracted,
    /// The token endpoint is being called.
    Exchanging,
    /// Tokens are stored on the profile.
    Complete,
    /// The token exchange failed.
    Error(TokenExchangeError),
    /// The flow ended without a code.
    Abandoned(AbandonReason),
}

impl FlowState {
    /// Returns `true` once nothing more will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error(_) | Self::Abandoned(_))
    }
}

fn enter(profile: &str, state: &FlowState) {
    debug!(profile, ?state, "authorization flow");
}

/// Runs OAuth2 authorization code and refresh token flows against profiles.
///
/// # Example
///
/// ```rust,no_run
/// use threeleg_core::{OAuth2Client, OAuth2Profile, OutboundRequest, SharedOAuth2Profile};
///
/// # async fn example() -> Result<(), threeleg_core::OAuth2Error> {
/// let client = OAuth2Client::builder().build()?;
/// let profile = SharedOAuth2Profile::new(
///     OAuth2Profile::builder("api")
///         .with_access_token_uri("https://auth.example.com/token")
///         .with_client_id("my-client")
///         .with_client_secret("my-secret")
///         .with_refresh_token("refresh-token")
///         .build(),
/// );
///
/// client.refresh_access_token(&profile).await?;
///
/// let mut request = OutboundRequest::new();
/// client.apply_access_token(&profile, &mut request).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    exchanger: TokenExchanger,
    consent_surface: Option<Arc<dyn ConsentSurface>>,
    consent_timeout: Option<Duration>,
}

impl OAuth2Client {
    /// Creates a builder.
    pub fn builder() -> OAuth2ClientBuilder {
        OAuth2ClientBuilder::default()
    }

    /// The token endpoint client.
    pub fn exchanger(&self) -> &TokenExchanger {
        &self.exchanger
    }

    /// Starts an interactive authorization on `profile`.
    ///
    /// Returns as soon as the consent surface is open. The code exchange and
    /// the token update happen later on a spawned task, which must run inside
    /// a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`OAuth2Error::InvalidParameters`] if the resolved profile is invalid
    /// - [`OAuth2Error::UrlConstruction`] if the authorization URL cannot be encoded
    /// - [`OAuth2Error::ConsentSurface`] if no surface is configured or it fails to open
    /// - [`OAuth2Error::AuthorizationPending`] if another flow is waiting on this profile
    ///
    /// Nothing is opened when an error is returned.
    pub async fn request_access_token(
        &self,
        profile: &SharedOAuth2Profile,
    ) -> Result<PendingAuthorization, OAuth2Error> {
        let name = profile.name();
        self.start_authorization(profile)
            .await
            .inspect_err(|err| {
                error!(profile = %name, error = %err, "cannot request access token");
            })
    }

    async fn start_authorization(
        &self,
        profile: &SharedOAuth2Profile,
    ) -> Result<PendingAuthorization, OAuth2Error> {
        let name = profile.name();
        enter(name, &FlowState::Idle);

        let parameters = OAuth2Parameters::resolve(profile);
        enter(name, &FlowState::ParametersBuilt);

        let validated = parameters.validate()?;
        enter(name, &FlowState::Validated);

        let url = validated.authorization_url()?;
        enter(name, &FlowState::AuthorizationUrlReady);

        let surface = self
            .consent_surface
            .clone()
            .ok_or_else(|| OAuth2Error::ConsentSurface {
                reason: "no consent surface configured".to_string(),
            })?;
        let guard = profile
            .try_begin_flow()
            .ok_or_else(|| OAuth2Error::AuthorizationPending {
                profile: name.to_string(),
            })?;

        let previous_status = profile.access_token_status().await;
        let (listener, events) = ConsentListener::channel();
        let (state, state_receiver) = watch::channel(FlowState::AwaitingConsent);
        let cancel = Arc::new(Notify::new());

        profile
            .set_access_token_status(Some(AccessTokenStatus::WaitingForAuthorization))
            .await;
        if let Err(err) = surface.open(&url, listener) {
            profile.set_access_token_status(previous_status).await;
            return Err(OAuth2Error::ConsentSurface {
                reason: err.to_string(),
            });
        }
        info!(
            profile = %name,
            %url,
            mode = ?validated.redirect().consent_mode(),
            "consent surface opened"
        );
        enter(name, &FlowState::AwaitingConsent);

        let task = ConsentTask {
            profile: profile.clone(),
            parameters: validated,
            surface,
            exchanger: self.exchanger.clone(),
            events,
            cancel: Arc::clone(&cancel),
            timeout: self.consent_timeout,
            state,
            previous_status,
            guard,
        };
        tokio::spawn(task.run());

        Ok(PendingAuthorization::new(
            name.to_string(),
            url,
            state_receiver,
            cancel,
        ))
    }

    /// Trades the profile's refresh token for a new access token.
    ///
    /// A refresh token returned by the provider replaces the stored one.
    ///
    /// # Errors
    ///
    /// - [`OAuth2Error::InvalidParameters`] if the refresh token, client ID,
    ///   client secret or access token URI is missing or invalid
    /// - [`OAuth2Error::TokenExchange`] if the token endpoint call fails
    pub async fn refresh_access_token(
        &self,
        profile: &SharedOAuth2Profile,
    ) -> Result<(), OAuth2Error> {
        let name = profile.name();
        enter(name, &FlowState::Idle);

        let parameters = OAuth2Parameters::resolve(profile);
        enter(name, &FlowState::ParametersBuilt);

        let refresh_token = profile.refresh_token().await;
        let refresh =
            parameters.validate_for_refresh(refresh_token.as_ref().map(SecureString::as_str))?;
        enter(name, &FlowState::Validated);

        enter(name, &FlowState::Exchanging);
        let tokens = self
            .exchanger
            .exchange_refresh_token(&refresh)
            .await
            .inspect_err(|err| enter(name, &FlowState::Error(err.clone())))?;

        profile.apply_retrieved_tokens(&tokens).await;
        enter(name, &FlowState::Complete);
        info!(profile = %name, "access token refreshed");
        Ok(())
    }

    /// Places the profile's current access token on `request`.
    ///
    /// Never fails: without a token any `Authorization` header is removed,
    /// and a token that cannot be applied is logged and skipped.
    pub async fn apply_access_token(
        &self,
        profile: &SharedOAuth2Profile,
        request: &mut OutboundRequest,
    ) {
        let token = profile.access_token().await;
        apply::apply_access_token(token.as_ref(), profile.access_token_position(), request);
    }
}
