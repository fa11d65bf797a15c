//! Authorization session orchestration.
//!
//! An [`AuthSession`] owns everything a single authorization attempt
//! needs: the pending flow (state + verifier), the message bridge, the
//! popup handle and the timers. All waiting happens in one `select` loop
//! with a single owner, so completion on any path tears the whole set
//! down together - no listener or timer outlives the flow.
//!
//! Race rule: a result message that is already queued wins over popup-
//! closed detection; the loop always drains the message channel first.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::authorize::AuthorizationRequest;
use crate::bridge::{self, BridgeEvent, MessageBridge, WindowMessage};
use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};
use crate::flow::PendingAuthorization;
use crate::transport::{OpenMode, PopupOptions, UserAgent, WindowHandle};

/// Tuning for a session's transport and timers.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Popup or full-page redirect
    pub mode: OpenMode,
    /// Popup geometry (ignored in redirect mode)
    pub popup: PopupOptions,
    /// Overall deadline for the flow
    pub timeout: Duration,
    /// Popup closed-detection polling interval
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: OpenMode::Popup,
            popup: PopupOptions::default(),
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Terminal result of an authorization session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Consent granted; exchange `code` with the stored verifier
    Authorized {
        /// Authorization code extracted from the redirect URI
        code: String,
    },
    /// Consent denied by the user
    Denied,
    /// The user closed the window before completing the flow
    Cancelled,
    /// Full-page redirect was performed; the flow resumes via the
    /// backend's redirect to the registered callback
    Redirected,
    /// Charge approved in the consent window
    ChargeApproved {
        /// Charge identifier
        charge_id: String,
    },
    /// Charge rejected in the consent window
    ChargeRejected {
        /// Charge identifier
        charge_id: String,
    },
    /// Topup flow completed
    TopupCompleted {
        /// Charge created by the topup, when reported
        charge_id: Option<String>,
    },
    /// Topup flow cancelled
    TopupCancelled,
}

/// A single in-flight authorization attempt.
pub struct AuthSession {
    pending: PendingAuthorization,
    bridge: MessageBridge,
    popup: Option<Box<dyn WindowHandle>>,
    messages: mpsc::UnboundedReceiver<WindowMessage>,
    options: SessionOptions,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("flow_id", &self.pending.id())
            .field("armed", &self.bridge.is_armed())
            .field("popup_open", &self.popup.is_some())
            .finish()
    }
}

impl AuthSession {
    /// Build a fresh authorization request and present it through the
    /// user agent.
    ///
    /// In popup mode a blocked popup fails here, synchronously, and no
    /// closed-detection polling is ever started. In redirect mode the
    /// page navigates away and [`run`](Self::run) resolves immediately.
    ///
    /// # Errors
    ///
    /// Propagates CSPRNG failures, URL construction errors and
    /// [`AuthError::PopupBlocked`].
    pub fn open(
        config: &ClientConfig,
        user_agent: &dyn UserAgent,
        options: SessionOptions,
        messages: mpsc::UnboundedReceiver<WindowMessage>,
    ) -> AuthResult<Self> {
        let request = AuthorizationRequest::new(config)?;
        let (url, pending) = request.into_parts();
        Self::open_at(url, pending, config, user_agent, options, messages)
    }

    /// Open the charge-approval page for `charge_id`.
    ///
    /// Charge sessions carry no PKCE state; they resolve through the
    /// `charge_approved` / `charge_rejected` bridge events.
    ///
    /// # Errors
    ///
    /// Same surface as [`open`](Self::open), minus CSPRNG failures.
    pub fn open_charge_approval(
        config: &ClientConfig,
        charge_id: &str,
        user_agent: &dyn UserAgent,
        options: SessionOptions,
        messages: mpsc::UnboundedReceiver<WindowMessage>,
    ) -> AuthResult<Self> {
        let url = config.base_url.join(&format!("/oauth/approve/{charge_id}"))?;
        Self::open_at(
            url,
            PendingAuthorization::spent(),
            config,
            user_agent,
            options,
            messages,
        )
    }

    /// Open the topup page for the configured client.
    ///
    /// # Errors
    ///
    /// Same surface as [`open`](Self::open), minus CSPRNG failures.
    pub fn open_topup(
        config: &ClientConfig,
        user_agent: &dyn UserAgent,
        options: SessionOptions,
        messages: mpsc::UnboundedReceiver<WindowMessage>,
    ) -> AuthResult<Self> {
        let mut url = config.base_url.join("/oauth/topup")?;
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id);
        Self::open_at(
            url,
            PendingAuthorization::spent(),
            config,
            user_agent,
            options,
            messages,
        )
    }

    fn open_at(
        url: url::Url,
        pending: PendingAuthorization,
        config: &ClientConfig,
        user_agent: &dyn UserAgent,
        options: SessionOptions,
        messages: mpsc::UnboundedReceiver<WindowMessage>,
    ) -> AuthResult<Self> {
        let popup = match options.mode {
            OpenMode::Popup => Some(user_agent.open_popup(&url, &options.popup)?),
            OpenMode::Redirect => {
                user_agent.redirect(&url)?;
                None
            }
        };

        debug!(flow_id = %pending.id(), mode = ?options.mode, "authorization session opened");

        Ok(Self {
            pending,
            bridge: MessageBridge::new(config.expected_origin()),
            popup,
            messages,
            options,
        })
    }

    /// Correlation id of the underlying flow.
    pub fn flow_id(&self) -> uuid::Uuid {
        self.pending.id()
    }

    /// Wait for the flow to resolve.
    ///
    /// Resolution happens on the first of: an accepted bridge message,
    /// popup-closed detection, or the session timeout. Whatever the path,
    /// the popup is closed, the bridge disarmed and the poll stopped
    /// before this returns.
    ///
    /// # Errors
    ///
    /// [`AuthError::StateMismatch`] when a success message carries a
    /// foreign `state` (token exchange must not be attempted),
    /// [`AuthError::Timeout`] on deadline, [`AuthError::Cancelled`] when
    /// the host drops the message channel.
    pub async fn run(&mut self) -> AuthResult<AuthOutcome> {
        if self.popup.is_none() {
            // Redirect mode: nothing to wait for locally.
            return Ok(AuthOutcome::Redirected);
        }

        let mut poll = tokio::time::interval(self.options.poll_interval);
        let deadline = tokio::time::sleep(self.options.timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                // Drain queued messages before looking at popup state: a
                // success message followed by the popup closing itself
                // must resolve as success, not cancellation.
                biased;

                maybe = self.messages.recv() => match maybe {
                    Some(message) => {
                        if let Some(event) = self.bridge.accept(&message) {
                            break Self::resolve(&self.pending, event);
                        }
                    }
                    None => break Err(AuthError::Cancelled),
                },

                () = &mut deadline => break Err(AuthError::Timeout),

                _ = poll.tick() => {
                    if self.popup.as_ref().is_some_and(|w| w.is_closed()) {
                        debug!(flow_id = %self.pending.id(), "popup closed by user");
                        break Ok(AuthOutcome::Cancelled);
                    }
                }
            }
        };

        self.teardown(matches!(outcome, Ok(AuthOutcome::Authorized { .. })));
        outcome
    }

    fn resolve(pending: &PendingAuthorization, event: BridgeEvent) -> AuthResult<AuthOutcome> {
        match event {
            BridgeEvent::OauthSuccess { redirect_uri } => {
                let (code, state) = bridge::extract_code_and_state(&redirect_uri)?;
                // A session opened without PKCE state (charge/topup) can
                // never accept an authorization result.
                if pending.state().is_empty() || !pending.state_matches(&state) {
                    warn!(flow_id = %pending.id(), "state mismatch on authorization result");
                    return Err(AuthError::StateMismatch);
                }
                Ok(AuthOutcome::Authorized { code })
            }
            BridgeEvent::OauthDenied => Ok(AuthOutcome::Denied),
            BridgeEvent::ChargeApproved { charge_id } => Ok(AuthOutcome::ChargeApproved { charge_id }),
            BridgeEvent::ChargeRejected { charge_id } => Ok(AuthOutcome::ChargeRejected { charge_id }),
            BridgeEvent::TopupCompleted { charge_id } => Ok(AuthOutcome::TopupCompleted { charge_id }),
            BridgeEvent::TopupCancelled => Ok(AuthOutcome::TopupCancelled),
        }
    }

    /// Abort the flow: close the popup, disarm the bridge and spend the
    /// verifier so the attempt cannot be resumed.
    pub fn cancel(&mut self) {
        self.teardown(false);
    }

    fn teardown(&mut self, keep_verifier: bool) {
        if let Some(popup) = self.popup.take() {
            popup.close();
        }
        self.bridge.disarm();
        self.messages.close();
        if !keep_verifier {
            self.pending.discard();
        }
    }

    /// Hand over the pending flow, e.g. to persist it across a full-page
    /// redirect or to take the verifier for token exchange.
    pub fn into_pending(mut self) -> PendingAuthorization {
        if let Some(popup) = self.popup.take() {
            popup.close();
        }
        self.bridge.disarm();
        std::mem::replace(&mut self.pending, PendingAuthorization::spent())
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        if let Some(popup) = self.popup.take() {
            popup.close();
        }
    }
}
