//! Single-use pending authorization state.
//!
//! A [`PendingAuthorization`] binds a flow's `state` parameter to its PKCE
//! verifier. The verifier can be taken exactly once; afterwards the flow
//! is spent and any further use is an error. This mirrors the single-use
//! contract of authorization codes on the server side.

use secrecy::SecretString;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// The stored half of an in-flight authorization request.
#[derive(Debug)]
pub struct PendingAuthorization {
    id: Uuid,
    state: String,
    verifier: Option<SecretString>,
}

impl PendingAuthorization {
    /// Create a pending flow for a freshly built authorization request.
    pub(crate) fn new(state: String, verifier: SecretString) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            verifier: Some(verifier),
        }
    }

    /// A placeholder flow with no verifier, used when moving a real flow
    /// out of a structure that cannot be destructured.
    pub(crate) fn spent() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: String::new(),
            verifier: None,
        }
    }

    /// Correlation id for logging and event attribution.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The `state` parameter this flow was started with.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Compare a returned `state` against the stored one in constant time.
    pub fn state_matches(&self, returned: &str) -> bool {
        self.state.as_bytes().ct_eq(returned.as_bytes()).into()
    }

    /// Take the code verifier for token exchange.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::VerifierConsumed`] on any call after the
    /// first; a spent flow must be restarted from a new request.
    pub fn take_verifier(&mut self) -> AuthResult<SecretString> {
        self.verifier.take().ok_or(AuthError::VerifierConsumed)
    }

    /// Whether the verifier has already been consumed.
    pub fn is_spent(&self) -> bool {
        self.verifier.is_none()
    }

    /// Discard the verifier without using it. Called on every failure path
    /// so an aborted flow can never be resumed.
    pub fn discard(&mut self) {
        self.verifier = None;
    }
}
