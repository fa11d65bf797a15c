//! Error types for the Kimlik Connect SDK.
//!
//! The taxonomy follows the protocol boundaries:
//! - Transport errors (network failure, popup blocked) surface immediately
//! - Protocol errors (state mismatch, consumed verifier) are fatal to the
//!   current flow and require a fresh authorization request
//! - Backend-reported errors carry the server's `error`/`error_description`
//!   verbatim so integrators can branch on codes such as `invalid_grant`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for SDK operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// OAuth error body returned by the backend on non-2xx responses
/// (RFC 6749 Section 5.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthErrorBody {
    /// Machine-readable error code (e.g. `invalid_grant`, `access_denied`)
    pub error: String,

    /// Human-readable description, if the server provided one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl std::fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Errors produced by the authorization, consent and token-exchange flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The platform's secure random source is unavailable. Never falls back
    /// to a weaker generator.
    #[error("secure random source unavailable: {0}")]
    RandomUnavailable(String),

    /// Invalid client or flow configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The user agent refused to open the popup window
    #[error("popup window was blocked by the user agent")]
    PopupBlocked,

    /// The `state` returned by the authorization server does not match the
    /// one stored for the active flow
    #[error("state parameter does not match the pending authorization")]
    StateMismatch,

    /// The PKCE code verifier for this flow was already consumed
    #[error("code verifier was already consumed for this flow")]
    VerifierConsumed,

    /// The redirect URI delivered on success is missing `code` or `state`
    #[error("malformed redirect URI in authorization result: {0}")]
    MalformedRedirect(String),

    /// A decision for this context is already in flight or was already
    /// delivered
    #[error("a decision submission is already in flight")]
    SubmissionInFlight,

    /// The requested decision is not permitted in the current phase or is
    /// disabled by server-provided flags
    #[error("decision not allowed: {0}")]
    DecisionNotAllowed(String),

    /// The user denied the authorization request
    #[error("the user denied the authorization request")]
    ConsentDenied,

    /// The user closed the window before completing the flow
    #[error("flow was cancelled before completion")]
    Cancelled,

    /// The flow did not complete within the configured timeout
    #[error("flow timed out waiting for an authorization result")]
    Timeout,

    /// The context fetch was rejected as unauthenticated; callers should
    /// redirect to login with a return target instead of treating this as
    /// a hard failure
    #[error("backend rejected the request as unauthenticated")]
    Unauthenticated,

    /// The backend reported a structured OAuth error
    #[error("backend returned {status}: {body}")]
    Backend {
        /// HTTP status code of the response
        status: u16,
        /// Parsed error body
        body: OAuthErrorBody,
    },

    /// Network or protocol-level HTTP failure
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL construction or parsing failure
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    /// Build a backend error from a status code and a best-effort parse of
    /// the response body.
    ///
    /// Bodies that are not the RFC 6749 error shape fall back to a
    /// `{message}` field, then to the raw status.
    pub fn from_backend_body(status: u16, body: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<OAuthErrorBody>(body) {
            return Self::Backend {
                status,
                body: parsed,
            };
        }

        #[derive(Deserialize)]
        struct MessageBody {
            message: String,
        }

        let error_description = serde_json::from_str::<MessageBody>(body)
            .map(|m| m.message)
            .ok();

        Self::Backend {
            status,
            body: OAuthErrorBody {
                error: "server_error".to_string(),
                error_description,
            },
        }
    }

    /// Stable machine-readable code for this error, used for localized
    /// message lookup and for the widget's error events.
    pub fn code(&self) -> &str {
        match self {
            Self::RandomUnavailable(_) => "random_unavailable",
            Self::Config(_) => "invalid_request",
            Self::PopupBlocked => "popup_blocked",
            Self::StateMismatch => "state_mismatch",
            Self::VerifierConsumed => "verifier_consumed",
            Self::MalformedRedirect(_) => "malformed_redirect",
            Self::SubmissionInFlight => "submission_in_flight",
            Self::DecisionNotAllowed(_) => "decision_not_allowed",
            Self::ConsentDenied => "access_denied",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
            Self::Unauthenticated => "unauthenticated",
            Self::Backend { body, .. } => &body.error,
            Self::Http(_) => "network_error",
            Self::Url(_) => "invalid_request",
        }
    }

    /// Whether the current flow must be restarted from a fresh
    /// authorization request.
    pub fn is_fatal_to_flow(&self) -> bool {
        matches!(
            self,
            Self::StateMismatch | Self::VerifierConsumed | Self::Timeout | Self::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_body_parses_rfc6749_shape() {
        let err = AuthError::from_backend_body(
            400,
            r#"{"error":"invalid_grant","error_description":"Authorization code expired"}"#,
        );
        match err {
            AuthError::Backend { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body.error, "invalid_grant");
                assert_eq!(
                    body.error_description.as_deref(),
                    Some("Authorization code expired")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn backend_body_falls_back_to_message_field() {
        let err = AuthError::from_backend_body(422, r#"{"message":"Amount is too small"}"#);
        assert_eq!(err.code(), "server_error");
        match err {
            AuthError::Backend { body, .. } => {
                assert_eq!(body.error_description.as_deref(), Some("Amount is too small"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn protocol_errors_are_fatal_to_the_flow() {
        assert!(AuthError::StateMismatch.is_fatal_to_flow());
        assert!(AuthError::VerifierConsumed.is_fatal_to_flow());
        assert!(AuthError::Timeout.is_fatal_to_flow());
        assert!(!AuthError::PopupBlocked.is_fatal_to_flow());
        assert!(!AuthError::SubmissionInFlight.is_fatal_to_flow());
    }

    #[test]
    fn backend_body_tolerates_non_json() {
        let err = AuthError::from_backend_body(502, "<html>bad gateway</html>");
        match err {
            AuthError::Backend { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.error, "server_error");
                assert!(body.error_description.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
