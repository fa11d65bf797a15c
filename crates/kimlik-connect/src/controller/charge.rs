//! Controller for the charge-approval page.

use tracing::debug;

use crate::api::types::{ChargeContext, ChargeDecision, ChargeDecisionRequest};
use crate::api::BackendClient;
use crate::bridge::BridgeEvent;
use crate::error::{AuthError, AuthResult};

use super::{ensure_ready, CompletionSignal, FlowFailure, Loaded, Phase, CLOSE_DELAY};

/// Drives the charge-approval page.
///
/// Approvability is decided entirely by server-provided flags
/// (`can_approve`, `is_expired`, `wallet.sufficient`); the controller
/// never re-derives them from amounts or timestamps. Rejection stays
/// available even when approval is disabled.
#[derive(Debug)]
pub struct ChargeController {
    client: BackendClient,
    charge_id: String,
    opener_present: bool,
    phase: Phase,
    context: Option<ChargeContext>,
    failure: Option<FlowFailure>,
}

impl ChargeController {
    /// Create a controller for the charge with `charge_id`.
    pub fn new(client: BackendClient, charge_id: impl Into<String>, opener_present: bool) -> Self {
        Self {
            client,
            charge_id: charge_id.into(),
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
    pub fn context(&self) -> Option<&ChargeContext> {
        self.context.as_ref()
    }

    /// The failure to render, once `Failed`.
    pub fn failure(&self) -> Option<&FlowFailure> {
        self.failure.as_ref()
    }

    /// Whether the approve action is enabled. All three server flags must
    /// agree; an insufficient balance disables approval regardless of
    /// `can_approve`.
    pub fn can_approve(&self) -> bool {
        self.context.as_ref().is_some_and(|ctx| {
            ctx.charge.can_approve && !ctx.charge.is_expired && ctx.wallet.sufficient
        })
    }

    /// Why the approve action is disabled, as a stable code for the
    /// localized message table. `None` when approval is available.
    pub fn approve_blocked_reason(&self) -> Option<&'static str> {
        let ctx = self.context.as_ref()?;
        if ctx.charge.is_expired {
            Some("charge_expired")
        } else if !ctx.wallet.sufficient {
            Some("insufficient_balance")
        } else if !ctx.charge.can_approve {
            Some("decision_not_allowed")
        } else {
            None
        }
    }

    /// Fetch the charge context.
    ///
    /// # Errors
    ///
    /// Backend errors transition to `Failed`; a 401 yields
    /// [`Loaded::LoginRequired`] instead of an error.
    pub async fn load(&mut self) -> AuthResult<Loaded<&ChargeContext>> {
        if self.phase != Phase::Loading {
            return Err(AuthError::DecisionNotAllowed(
                "context was already loaded".to_string(),
            ));
        }

        match self.client.charge_context(&self.charge_id).await {
            Ok(context) => {
                debug!(charge_id = %self.charge_id, status = ?context.charge.status, "charge context loaded");
                self.phase = Phase::Ready;
                Ok(Loaded::Ready(self.context.insert(context)))
            }
            Err(AuthError::Unauthenticated) => {
                let page = self
                    .client
                    .base_url()
                    .join(&format!("/oauth/approve/{}", self.charge_id))?;
                Ok(Loaded::LoginRequired(self.client.login_url(&page)?))
            }
            Err(error) => {
                self.failure = Some(FlowFailure::from_error(&error));
                self.phase = Phase::Failed;
                Err(error)
            }
        }
    }

    /// Submit the user's charge decision.
    ///
    /// An `auto_approve_limit` is advisory and attached only to
    /// approvals; the backend alone decides whether future charges skip
    /// interactive consent.
    ///
    /// # Errors
    ///
    /// Approvals blocked by server flags fail with
    /// [`AuthError::DecisionNotAllowed`] before any backend call; a
    /// failed submit returns to `Ready` for retry.
    pub async fn decide(
        &mut self,
        decision: ChargeDecision,
        auto_approve_limit: Option<f64>,
    ) -> AuthResult<CompletionSignal> {
        ensure_ready(self.phase)?;

        if decision == ChargeDecision::Approve && !self.can_approve() {
            let reason = self
                .approve_blocked_reason()
                .unwrap_or("decision_not_allowed");
            return Err(AuthError::DecisionNotAllowed(reason.to_string()));
        }

        let request = ChargeDecisionRequest {
            decision,
            auto_approve_limit: match decision {
                ChargeDecision::Approve => auto_approve_limit,
                ChargeDecision::Reject => None,
            },
        };

        self.phase = Phase::Submitting;
        match self
            .client
            .submit_charge_decision(&self.charge_id, &request)
            .await
        {
            Ok(()) => {
                self.phase = Phase::Succeeded;
                let event = match decision {
                    ChargeDecision::Approve => BridgeEvent::ChargeApproved {
                        charge_id: self.charge_id.clone(),
                    },
                    ChargeDecision::Reject => BridgeEvent::ChargeRejected {
                        charge_id: self.charge_id.clone(),
                    },
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
}
