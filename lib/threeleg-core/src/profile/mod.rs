//! OAuth2 profiles: endpoint configuration plus the current token state.
//!
//! A profile outlives any single authorization flow. Flows only read its raw
//! settings and write back through [`OAuth2Profile::apply_retrieved_tokens`]
//! and [`OAuth2Profile::set_access_token_status`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::exchange::TokenSet;
use crate::secret::SecureString;

mod expansion;
pub use self::expansion::{NoExpansion, PropertyContext, PropertyExpander};

mod settings;
pub use self::settings::{OAuth2ProfileBuilder, OAuth2ProfileSettings};
#[cfg(feature = "yaml")]
pub use self::settings::ProfileConfigError;

/// Where the bearer access token is placed on outbound requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenPosition {
    /// `Authorization: Bearer <token>` header.
    #[default]
    #[serde(alias = "HEADER")]
    Header,
    /// `access_token` query parameter.
    #[serde(alias = "QUERY")]
    Query,
    /// `access_token` form fragment appended to the body.
    #[serde(alias = "BODY")]
    Body,
}

/// Where the profile's current access token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenStatus {
    /// Set by hand in the profile configuration.
    EnteredManually,
    /// The consent surface is open and no code has been seen yet.
    WaitingForAuthorization,
    /// An authorization code was extracted and is being exchanged.
    ReceivedAuthorizationCode,
    /// Obtained from the provider token endpoint.
    RetrievedFromServer,
}

#[derive(Default)]
struct TokenState {
    access_token: Option<SecureString>,
    refresh_token: Option<SecureString>,
    status: Option<AccessTokenStatus>,
}

/// OAuth2 profile: raw endpoint and credential settings, injection position,
/// and the tokens obtained so far.
///
/// Use [`OAuth2ProfileBuilder`] (or [`OAuth2ProfileSettings`]) to create instances.
pub struct OAuth2Profile {
    name: String,
    settings: OAuth2ProfileSettings,
    expander: Arc<dyn PropertyExpander>,
    tokens: RwLock<TokenState>,
    flow_in_progress: Arc<AtomicBool>,
}

impl OAuth2Profile {
    /// Creates a builder for a named profile.
    pub fn builder(name: impl Into<String>) -> OAuth2ProfileBuilder {
        OAuth2ProfileBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: String,
        settings: OAuth2ProfileSettings,
        expander: Arc<dyn PropertyExpander>,
    ) -> Self {
        let access_token = settings
            .access_token
            .clone()
            .filter(|token| !token.is_blank());
        let refresh_token = settings
            .refresh_token
            .clone()
            .filter(|token| !token.is_blank());
        let status = access_token
            .as_ref()
            .map(|_| AccessTokenStatus::EnteredManually);

        Self {
            name,
            settings,
            expander,
            tokens: RwLock::new(TokenState {
                access_token,
                refresh_token,
                status,
            }),
            flow_in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The profile name, used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw authorization endpoint, possibly containing placeholders.
    pub fn authorization_uri(&self) -> &str {
        &self.settings.authorization_uri
    }

    /// Raw redirect URI, possibly containing placeholders.
    pub fn redirect_uri(&self) -> &str {
        &self.settings.redirect_uri
    }

    /// Raw token endpoint, possibly containing placeholders.
    pub fn access_token_uri(&self) -> &str {
        &self.settings.access_token_uri
    }

    /// Raw client identifier, possibly containing placeholders.
    pub fn client_id(&self) -> &str {
        &self.settings.client_id
    }

    /// Raw client secret, possibly containing placeholders.
    pub fn client_secret(&self) -> &SecureString {
        &self.settings.client_secret
    }

    /// Raw scope, possibly containing placeholders.
    pub fn scope(&self) -> &str {
        &self.settings.scope
    }

    /// Where the access token goes on outbound requests.
    pub fn access_token_position(&self) -> AccessTokenPosition {
        self.settings.access_token_position
    }

    /// Expands placeholders in a raw value against the owning context.
    pub fn expand(&self, value: &str) -> String {
        self.expander.expand(value)
    }

    /// The current access token, `None` when absent or blank.
    pub async fn access_token(&self) -> Option<SecureString> {
        self.tokens.read().await.access_token.clone()
    }

    /// The current refresh token, `None` when absent or blank.
    pub async fn refresh_token(&self) -> Option<SecureString> {
        self.tokens.read().await.refresh_token.clone()
    }

    /// Where the current access token came from.
    pub async fn access_token_status(&self) -> Option<AccessTokenStatus> {
        self.tokens.read().await.status
    }

    /// Replaces the access token by hand. A blank token clears it.
    ///
    /// The status becomes [`AccessTokenStatus::EnteredManually`], or `None`
    /// once cleared.
    pub async fn set_access_token(&self, token: impl Into<SecureString>) {
        let token = Some(token.into()).filter(|token| !token.is_blank());
        debug!(profile = %self.name, present = token.is_some(), "access token updated");
        let mut tokens = self.tokens.write().await;
        tokens.status = token.as_ref().map(|_| AccessTokenStatus::EnteredManually);
        tokens.access_token = token;
    }

    /// Replaces the refresh token. A blank token clears it.
    pub async fn set_refresh_token(&self, token: impl Into<SecureString>) {
        let token = Some(token.into()).filter(|token| !token.is_blank());
        debug!(profile = %self.name, present = token.is_some(), "refresh token updated");
        self.tokens.write().await.refresh_token = token;
    }

    /// Stores tokens returned by the provider token endpoint.
    ///
    /// The refresh token is only replaced when the response carried one.
    pub async fn apply_retrieved_tokens(&self, tokens: &TokenSet) {
        let mut state = self.tokens.write().await;
        state.access_token = Some(tokens.access_token().clone());
        if let Some(refresh_token) = tokens.refresh_token() {
            state.refresh_token = Some(refresh_token.clone());
        }
        state.status = Some(AccessTokenStatus::RetrievedFromServer);
        debug!(
            profile = %self.name,
            rotated_refresh_token = tokens.refresh_token().is_some(),
            "retrieved tokens stored"
        );
    }

    /// Records where the current access token came from.
    pub async fn set_access_token_status(&self, status: Option<AccessTokenStatus>) {
        self.tokens.write().await.status = status;
    }

    /// Snapshot of the settings including the current tokens, for persistence.
    pub async fn to_settings(&self) -> OAuth2ProfileSettings {
        let tokens = self.tokens.read().await;
        OAuth2ProfileSettings {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            ..self.settings.clone()
        }
    }

    /// Marks an interactive flow as started, unless one already is.
    pub(crate) fn try_begin_flow(&self) -> Option<FlowGuard> {
        self.flow_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlowGuard {
                flag: Arc::clone(&self.flow_in_progress),
            })
    }

    /// Returns `true` while an interactive flow is in progress.
    pub fn is_flow_in_progress(&self) -> bool {
        self.flow_in_progress.load(Ordering::Acquire)
    }
}

impl fmt::Debug for OAuth2Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Profile")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("expander", &self.expander)
            .field("flow_in_progress", &self.is_flow_in_progress())
            .finish_non_exhaustive()
    }
}

/// Releases the profile's single-flight flag on drop.
#[derive(Debug)]
pub(crate) struct FlowGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for FlowGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Wraps [`OAuth2Profile`] in an `Arc` so flows running on other tasks can
/// write tokens back.
#[derive(Debug, Clone, derive_more::Deref)]
pub struct SharedOAuth2Profile(Arc<OAuth2Profile>);

impl SharedOAuth2Profile {
    /// Creates a new shared profile.
    pub fn new(profile: OAuth2Profile) -> Self {
        Self(Arc::new(profile))
    }

    /// Returns a reference to the inner profile.
    pub fn inner(&self) -> &OAuth2Profile {
        &self.0
    }
}

impl From<OAuth2Profile> for SharedOAuth2Profile {
    fn from(profile: OAuth2Profile) -> Self {
        Self::new(profile)
    }
}
