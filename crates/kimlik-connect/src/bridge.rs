//! Cross-window message bridge.
//!
//! The consent window signals its result to the opener through a single
//! serialized message. The bridge validates the sender origin against the
//! configured backend origin, narrows the payload into a typed
//! [`BridgeEvent`], and disarms itself after the first accepted event so
//! every flow sees at most one result.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AuthError, AuthResult};

/// A raw window message as delivered by the embedding shell.
#[derive(Debug, Clone)]
pub struct WindowMessage {
    /// Origin of the sending window, exactly as the platform reports it
    pub origin: String,
    /// The serialized message payload
    pub data: serde_json::Value,
}

impl WindowMessage {
    /// Convenience constructor for hosts and tests.
    pub fn new(origin: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

/// Typed result messages posted by the consent/charge/topup windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Consent granted; the redirect URI carries `code` and `state`
    OauthSuccess {
        /// Redirect URI produced by the backend on allow
        redirect_uri: String,
    },
    /// Consent denied by the user
    OauthDenied,
    /// Charge approved
    ChargeApproved {
        /// Charge identifier
        charge_id: String,
    },
    /// Charge rejected
    ChargeRejected {
        /// Charge identifier
        charge_id: String,
    },
    /// Topup flow completed
    TopupCompleted {
        /// Charge created by the topup, when the backend reports one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charge_id: Option<String>,
    },
    /// Topup flow cancelled
    TopupCancelled,
}

/// Origin-checked, exactly-once message acceptor for one flow instance.
#[derive(Debug)]
pub struct MessageBridge {
    expected_origin: String,
    armed: bool,
}

impl MessageBridge {
    /// Create a bridge accepting messages only from `expected_origin`.
    pub fn new(expected_origin: impl Into<String>) -> Self {
        Self {
            expected_origin: expected_origin.into(),
            armed: true,
        }
    }

    /// The origin this bridge accepts.
    pub fn expected_origin(&self) -> &str {
        &self.expected_origin
    }

    /// Whether the bridge is still waiting for its first event.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Inspect a window message.
    ///
    /// Returns the typed event on the first acceptable message. Messages
    /// from any other origin, unrecognized payloads, and anything arriving
    /// after the bridge has disarmed produce `None` and no state change.
    pub fn accept(&mut self, message: &WindowMessage) -> Option<BridgeEvent> {
        if !self.armed {
            debug!("bridge already disarmed; dropping message");
            return None;
        }

        if message.origin != self.expected_origin {
            warn!(
                origin = %message.origin,
                expected = %self.expected_origin,
                "ignoring window message from unexpected origin"
            );
            return None;
        }

        match serde_json::from_value::<BridgeEvent>(message.data.clone()) {
            Ok(event) => {
                self.armed = false;
                debug!(?event, "bridge accepted window message");
                Some(event)
            }
            Err(_) => {
                debug!("ignoring window message with unrecognized payload");
                None
            }
        }
    }

    /// Disarm without accepting anything (teardown path).
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

/// Extract the `code` and `state` query parameters from the redirect URI
/// carried by an `oauth_success` message.
///
/// # Errors
///
/// Returns [`AuthError::MalformedRedirect`] when the URI does not parse
/// or either parameter is missing.
pub fn extract_code_and_state(redirect_uri: &str) -> AuthResult<(String, String)> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| AuthError::MalformedRedirect(format!("{redirect_uri}: {e}")))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        (None, _) => Err(AuthError::MalformedRedirect(
            "redirect URI is missing the code parameter".to_string(),
        )),
        (_, None) => Err(AuthError::MalformedRedirect(
            "redirect URI is missing the state parameter".to_string(),
        )),
    }
}
