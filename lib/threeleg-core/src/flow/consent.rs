use std::future;
use std::sync::Arc;
use std::time::Duration;

use oauth2::AuthorizationCode;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use super::{AbandonReason, FlowState};
use crate::consent::{
    ConsentEvent, ConsentMode, ConsentSurface, extract_authorization_code, extract_title,
};
use crate::exchange::TokenExchanger;
use crate::parameters::ValidatedParameters;
use crate::profile::{AccessTokenStatus, FlowGuard, SharedOAuth2Profile};

/// Everything the consent wait owns once the surface is open.
pub(super) struct ConsentTask {
    pub(super) profile: SharedOAuth2Profile,
    pub(super) parameters: ValidatedParameters,
    pub(super) surface: Arc<dyn ConsentSurface>,
    pub(super) exchanger: TokenExchanger,
    pub(super) events: mpsc::UnboundedReceiver<ConsentEvent>,
    pub(super) cancel: Arc<Notify>,
    pub(super) timeout: Option<Duration>,
    pub(super) state: watch::Sender<FlowState>,
    pub(super) previous_status: Option<AccessTokenStatus>,
    pub(super) guard: FlowGuard,
}

enum Wait {
    Code(AuthorizationCode),
    Abandoned(AbandonReason),
}

impl ConsentTask {
    pub(super) async fn run(mut self) {
        let outcome = match self.wait_for_code().await {
            Wait::Code(code) => self.exchange(code).await,
            Wait::Abandoned(reason) => self.abandon(reason).await,
        };

        let Self {
            profile,
            state,
            guard,
            ..
        } = self;
        drop(guard);
        debug!(profile = %profile.name(), state = ?outcome, "authorization flow ended");
        state.send_replace(outcome);
    }

    async fn wait_for_code(&mut self) -> Wait {
        let mode = self.parameters.redirect().consent_mode();
        // a bound too far out to represent never elapses
        let deadline = self
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));

        loop {
            let event = tokio::select! {
                event = self.events.recv() => event,
                () = self.cancel.notified() => return Wait::Abandoned(AbandonReason::Cancelled),
                () = deadline_elapsed(deadline) => return Wait::Abandoned(AbandonReason::TimedOut),
            };

            match event {
                None | Some(ConsentEvent::Closed) => {
                    return Wait::Abandoned(AbandonReason::SurfaceClosed);
                }
                Some(ConsentEvent::LocationChanged(location)) if mode == ConsentMode::Location => {
                    if let Some(code) = extract_authorization_code(&location) {
                        return Wait::Code(code);
                    }
                    debug!(profile = %self.profile.name(), "location without authorization code");
                }
                Some(ConsentEvent::ContentChanged(content)) if mode == ConsentMode::Content => {
                    if let Some(code) = extract_title(&content).and_then(extract_authorization_code)
                    {
                        return Wait::Code(code);
                    }
                    debug!(profile = %self.profile.name(), "content without authorization code");
                }
                Some(event) => {
                    debug!(profile = %self.profile.name(), ?mode, ?event, "consent event ignored");
                }
            }
        }
    }

    async fn exchange(&self, code: AuthorizationCode) -> FlowState {
        let name = self.profile.name();
        self.enter(FlowState::CodeExtracted);
        self.profile
            .set_access_token_status(Some(AccessTokenStatus::ReceivedAuthorizationCode))
            .await;

        self.enter(FlowState::Exchanging);
        match self.exchanger.exchange_code(&self.parameters, &code).await {
            Ok(tokens) => {
                self.profile.apply_retrieved_tokens(&tokens).await;
                info!(profile = %name, "access token retrieved");
                self.surface.close();
                FlowState::Complete
            }
            Err(err) => {
                error!(profile = %name, error = %err, "authorization code exchange failed");
                self.profile
                    .set_access_token_status(self.previous_status)
                    .await;
                FlowState::Error(err)
            }
        }
    }

    async fn abandon(&self, reason: AbandonReason) -> FlowState {
        let name = self.profile.name();
        match reason {
            AbandonReason::SurfaceClosed => {
                info!(profile = %name, "consent surface closed before authorization");
            }
            AbandonReason::Cancelled | AbandonReason::TimedOut => {
                warn!(profile = %name, ?reason, "authorization abandoned");
                self.surface.close();
            }
        }
        self.profile
            .set_access_token_status(self.previous_status)
            .await;
        FlowState::Abandoned(reason)
    }

    fn enter(&self, state: FlowState) {
        debug!(profile = %self.profile.name(), ?state, "authorization flow");
        self.state.send_replace(state);
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}
