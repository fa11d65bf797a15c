//! Controller for the authorize/consent page.

use tracing::debug;
use url::Url;

use crate::api::types::{ConsentContext, Decision};
use crate::api::BackendClient;
use crate::authorize::AuthorizeParams;
use crate::bridge::BridgeEvent;
use crate::error::{AuthError, AuthResult};

use super::{ensure_ready, CompletionSignal, FlowFailure, Loaded, Phase, CLOSE_DELAY};

/// Drives the consent page: fetch context, take the user's allow/deny
/// decision, deliver the result to the opener or follow the redirect.
#[derive(Debug)]
pub struct ConsentController {
    client: BackendClient,
    params: AuthorizeParams,
    opener_present: bool,
    phase: Phase,
    context: Option<ConsentContext>,
    failure: Option<FlowFailure>,
}

impl ConsentController {
    /// Create a controller for a consent page opened with `params`
    /// (parsed from the page URL or handed over by the session).
    pub fn new(client: BackendClient, params: AuthorizeParams, opener_present: bool) -> Self {
        Self {
            client,
            params,
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
    pub fn context(&self) -> Option<&ConsentContext> {
        self.context.as_ref()
    }

    /// The failure to render, once `Failed`.
    pub fn failure(&self) -> Option<&FlowFailure> {
        self.failure.as_ref()
    }

    /// Fetch the consent context with the exact parameters that will be
    /// submitted with the decision.
    ///
    /// A 401 is not a failure: it yields [`Loaded::LoginRequired`] with
    /// the current page URL as the return target, so the flow resumes
    /// after authentication.
    ///
    /// # Errors
    ///
    /// Other backend errors transition the page to `Failed` and are
    /// returned with the server's message intact.
    pub async fn load(&mut self) -> AuthResult<Loaded<&ConsentContext>> {
        if self.phase != Phase::Loading {
            return Err(AuthError::DecisionNotAllowed(
                "context was already loaded".to_string(),
            ));
        }

        match self.client.consent_context(&self.params).await {
            Ok(context) => {
                debug!(client_id = %self.params.client_id, "consent context loaded");
                self.phase = Phase::Ready;
                Ok(Loaded::Ready(self.context.insert(context)))
            }
            Err(AuthError::Unauthenticated) => {
                let login = self.client.login_url(&self.page_url()?)?;
                Ok(Loaded::LoginRequired(login))
            }
            Err(error) => {
                self.failure = Some(FlowFailure::from_error(&error));
                self.phase = Phase::Failed;
                Err(error)
            }
        }
    }

    /// Submit the user's decision.
    ///
    /// Accepted only in `Ready`; a submission already in flight or an
    /// already-delivered decision is rejected without a backend call. A
    /// failed submit returns to `Ready` so the user can retry.
    ///
    /// # Errors
    ///
    /// [`AuthError::SubmissionInFlight`], [`AuthError::DecisionNotAllowed`],
    /// or the backend error from the submission itself.
    pub async fn decide(&mut self, decision: Decision) -> AuthResult<CompletionSignal> {
        ensure_ready(self.phase)?;
        self.phase = Phase::Submitting;

        match self.client.submit_consent(&self.params, decision).await {
            Ok(redirect) => {
                let signal = if self.opener_present {
                    let event = match decision {
                        Decision::Allow => BridgeEvent::OauthSuccess {
                            redirect_uri: redirect.redirect_uri,
                        },
                        Decision::Deny => BridgeEvent::OauthDenied,
                    };
                    Ok(CompletionSignal::PostToOpener {
                        event,
                        close_after: CLOSE_DELAY,
                    })
                } else {
                    Url::parse(&redirect.redirect_uri)
                        .map(CompletionSignal::Redirect)
                        .map_err(AuthError::from)
                };
                match signal {
                    Ok(signal) => {
                        self.phase = Phase::Succeeded;
                        Ok(signal)
                    }
                    Err(error) => {
                        // The decision was delivered but the redirect is
                        // unusable; the page can only render the error.
                        self.failure = Some(FlowFailure::from_error(&error));
                        self.phase = Phase::Failed;
                        Err(error)
                    }
                }
            }
            Err(error) => {
                // Context is still valid; the decision can be retried.
                self.phase = Phase::Ready;
                Err(error)
            }
        }
    }

    fn page_url(&self) -> AuthResult<Url> {
        let mut url = self.client.base_url().join("/oauth/authorize")?;
        self.params.apply_to(&mut url);
        Ok(url)
    }
}
