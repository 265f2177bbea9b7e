use std::sync::Arc;

use tokio::sync::{Notify, watch};
use url::Url;

use super::FlowState;

/// Handle on an interactive authorization waiting for consent.
///
/// Dropping the handle does not stop the flow: the exchange still happens
/// and the profile is still updated once the user consents. Clones share the
/// same flow.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    profile: String,
    authorization_url: Url,
    state: watch::Receiver<FlowState>,
    cancel: Arc<Notify>,
}

impl PendingAuthorization {
    pub(super) fn new(
        profile: String,
        authorization_url: Url,
        state: watch::Receiver<FlowState>,
        cancel: Arc<Notify>,
    ) -> Self {
        Self {
            profile,
            authorization_url,
            state,
            cancel,
        }
    }

    /// Name of the profile being authorized.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The URL the consent surface was opened on.
    pub fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// Current state of the flow.
    pub fn state(&self) -> FlowState {
        self.state.borrow().clone()
    }

    /// Waits until the flow reaches a terminal state and returns it.
    pub async fn wait(&self) -> FlowState {
        let mut state = self.state.clone();
        if let Ok(terminal) = state.wait_for(FlowState::is_terminal).await {
            return terminal.clone();
        }
        state.borrow().clone()
    }

    /// Asks the flow to stop waiting for consent and close the surface.
    ///
    /// Has no effect once a code was extracted.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}
