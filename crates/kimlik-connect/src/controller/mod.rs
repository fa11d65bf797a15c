//! Consent, charge-approval and topup page controllers.
//!
//! Each controller drives one backend-rendered decision page through the
//! same machine: `Loading -> Ready -> Submitting -> done`. Submissions
//! are guarded so a decision can never reach the backend twice, and a
//! failed submit drops back to `Ready` so the user can retry without
//! refetching context.
//!
//! Controllers never touch windows themselves. A completed decision
//! yields a [`CompletionSignal`] describing what the page should do:
//! post a typed message to the opener and close, follow a server-directed
//! redirect, or render the terminal state in place.

mod charge;
mod consent;
mod topup;

pub use charge::ChargeController;
pub use consent::ConsentController;
pub use topup::TopupController;

use std::time::Duration;

use url::Url;

use crate::bridge::BridgeEvent;
use crate::error::{AuthError, AuthResult};

/// Delay between posting the result to the opener and closing the
/// consent window, giving the message time to be delivered.
pub const CLOSE_DELAY: Duration = Duration::from_millis(1000);

/// Lifecycle of a decision page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Context fetch in progress
    Loading,
    /// Context rendered, awaiting the user's decision
    Ready,
    /// Decision submission in flight; further submissions are rejected
    Submitting,
    /// Decision delivered
    Succeeded,
    /// Context fetch failed; the page renders the error and offers to
    /// close, never auto-retrying
    Failed,
}

/// Result of a context fetch.
#[derive(Debug)]
pub enum Loaded<T> {
    /// Context available; the page can render
    Ready(T),
    /// The user is not authenticated; redirect to this login URL, which
    /// carries the current page as a return target
    LoginRequired(Url),
}

/// Error snapshot kept for rendering after a failed load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFailure {
    /// Machine-readable code (for localized lookup)
    pub code: String,
    /// Human-readable message (backend-provided where available)
    pub message: String,
}

impl FlowFailure {
    pub(crate) fn from_error(error: &AuthError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// What a finished decision page should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSignal {
    /// Post a typed message to the opener window, then close after the
    /// given delay
    PostToOpener {
        /// The message to post (origin-checked by the opener's bridge)
        event: BridgeEvent,
        /// How long to wait before closing
        close_after: Duration,
    },
    /// Follow a server-directed redirect (full-page flows)
    Redirect(Url),
    /// No opener and no server redirect: render the terminal state
    RenderSuccess,
}

/// Guard shared by all controllers: decisions are accepted only in
/// `Ready`, and an in-flight submission blocks a second one.
pub(crate) fn ensure_ready(phase: Phase) -> AuthResult<()> {
    match phase {
        Phase::Ready => Ok(()),
        Phase::Submitting => Err(AuthError::SubmissionInFlight),
        Phase::Loading => Err(AuthError::DecisionNotAllowed(
            "context has not been loaded".to_string(),
        )),
        Phase::Succeeded => Err(AuthError::DecisionNotAllowed(
            "a decision was already delivered".to_string(),
        )),
        Phase::Failed => Err(AuthError::DecisionNotAllowed(
            "the page failed to load".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_is_the_only_submittable_phase() {
        assert!(ensure_ready(Phase::Ready).is_ok());
        assert!(matches!(
            ensure_ready(Phase::Submitting),
            Err(AuthError::SubmissionInFlight)
        ));
        assert!(ensure_ready(Phase::Loading).is_err());
        assert!(ensure_ready(Phase::Succeeded).is_err());
        assert!(ensure_ready(Phase::Failed).is_err());
    }
}
