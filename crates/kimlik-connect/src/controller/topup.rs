//! Controller for the topup page.

use tracing::debug;

use crate::api::types::TopupContext;
use crate::api::BackendClient;
use crate::bridge::BridgeEvent;
use crate::error::{AuthError, AuthResult};

use super::{ensure_ready, CompletionSignal, FlowFailure, Loaded, Phase, CLOSE_DELAY};

/// Drives the topup page: fetch wallet context, create a topup charge,
/// signal the opener.
#[derive(Debug)]
pub struct TopupController {
    client: BackendClient,
    client_id: String,
    opener_present: bool,
    phase: Phase,
    context: Option<TopupContext>,
    failure: Option<FlowFailure>,
}

impl TopupController {
    /// Create a controller for a topup requested by `client_id`.
    pub fn new(client: BackendClient, client_id: impl Into<String>, opener_present: bool) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            opener_present,
            phase: Phase::Loading,
            context: None,
            failure: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The fetched context, once `Ready`.
    pub fn context(&self) -> Option<&TopupContext> {
        self.context.as_ref()
    }

    /// The failure to render, once `Failed`.
    pub fn failure(&self) -> Option<&FlowFailure> {
        self.failure.as_ref()
    }

    /// Fetch the topup context.
    ///
    /// # Errors
    ///
    /// Backend errors transition to `Failed`; a 401 yields
    /// [`Loaded::LoginRequired`] instead of an error.
    pub async fn load(&mut self) -> AuthResult<Loaded<&TopupContext>> {
        if self.phase != Phase::Loading {
            return Err(AuthError::DecisionNotAllowed(
                "context was already loaded".to_string(),
            ));
        }

        match self.client.topup_context(&self.client_id).await {
            Ok(context) => {
                debug!(client_id = %self.client_id, "topup context loaded");
                self.phase = Phase::Ready;
                Ok(Loaded::Ready(self.context.insert(context)))
            }
            Err(AuthError::Unauthenticated) => {
                let mut page = self.client.base_url().join("/oauth/topup")?;
                page.query_pairs_mut()
                    .append_pair("client_id", &self.client_id);
                Ok(Loaded::LoginRequired(self.client.login_url(&page)?))
            }
            Err(error) => {
                self.failure = Some(FlowFailure::from_error(&error));
                self.phase = Phase::Failed;
                Err(error)
            }
        }
    }

    /// Create the topup charge.
    ///
    /// # Errors
    ///
    /// Non-positive amounts are rejected before any backend call; a
    /// failed submit returns to `Ready` for retry.
    pub async fn submit(&mut self, amount: f64) -> AuthResult<CompletionSignal> {
        ensure_ready(self.phase)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AuthError::DecisionNotAllowed(
                "topup amount must be positive".to_string(),
            ));
        }

        self.phase = Phase::Submitting;
        match self.client.submit_topup(&self.client_id, amount).await {
            Ok(receipt) => {
                self.phase = Phase::Succeeded;
                let event = BridgeEvent::TopupCompleted {
                    charge_id: Some(receipt.charge_id),
                };
                Ok(if self.opener_present {
                    CompletionSignal::PostToOpener {
                        event,
                        close_after: CLOSE_DELAY,
                    }
                } else {
                    CompletionSignal::RenderSuccess
                })
            }
            Err(error) => {
                self.phase = Phase::Ready;
                Err(error)
            }
        }
    }

    /// Cancel the topup without a backend call.
    ///
    /// # Errors
    ///
    /// Only a page that is `Ready` (or still `Loading`) can cancel; a
    /// delivered decision cannot be taken back.
    pub fn cancel(&mut self) -> AuthResult<CompletionSignal> {
        match self.phase {
            Phase::Loading | Phase::Ready | Phase::Failed => {
                self.phase = Phase::Succeeded;
                Ok(if self.opener_present {
                    CompletionSignal::PostToOpener {
                        event: BridgeEvent::TopupCancelled,
                        close_after: CLOSE_DELAY,
                    }
                } else {
                    CompletionSignal::RenderSuccess
                })
            }
            Phase::Submitting => Err(AuthError::SubmissionInFlight),
            Phase::Succeeded => Err(AuthError::DecisionNotAllowed(
                "the topup was already completed".to_string(),
            )),
        }
    }
}
