//! PKCE (Proof Key for Code Exchange) primitives - RFC 7636.
//!
//! Generates cryptographically secure code verifier / code challenge pairs
//! using the S256 method. The verifier is held behind [`SecretString`] and
//! consumed exactly once at token exchange; it is zeroized on drop.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, AuthResult};

/// Raw entropy for the code verifier. 48 bytes encode to a 64-character
/// verifier, within the 43-128 range required by RFC 7636 Section 4.1.
const VERIFIER_ENTROPY_BYTES: usize = 48;

/// Raw entropy for the `state` parameter.
const STATE_ENTROPY_BYTES: usize = 32;

/// A PKCE code verifier and its S256 challenge.
#[derive(Debug)]
pub struct PkcePair {
    verifier: SecretString,
    challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair from the operating system CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RandomUnavailable`] if the OS random source
    /// fails. There is no fallback to a non-cryptographic generator.
    pub fn generate() -> AuthResult<Self> {
        let mut entropy = [0u8; VERIFIER_ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut entropy)
            .map_err(|e| AuthError::RandomUnavailable(e.to_string()))?;

        let verifier = URL_SAFE_NO_PAD.encode(entropy);
        debug_assert!(is_valid_verifier(&verifier));

        let challenge = derive_challenge(&verifier);
        Ok(Self {
            verifier: SecretString::new(verifier),
            challenge,
        })
    }

    /// The S256 code challenge, sent in the authorization request.
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Consume the pair, yielding the verifier for storage in a pending
    /// flow. The challenge is discarded; it can always be re-derived.
    pub fn into_verifier(self) -> SecretString {
        self.verifier
    }

    /// Check that this pair's challenge matches its verifier.
    pub fn is_consistent(&self) -> bool {
        derive_challenge(self.verifier.expose_secret()) == self.challenge
    }
}

/// Compute `BASE64URL(SHA256(verifier))` without padding.
pub fn derive_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Validate a verifier against the RFC 7636 grammar:
/// 43-128 characters from `[A-Za-z0-9\-._~]`.
pub fn is_valid_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

/// Generate a random opaque `state` parameter for CSRF binding.
///
/// # Errors
///
/// Returns [`AuthError::RandomUnavailable`] if the OS random source fails.
pub fn generate_state() -> AuthResult<String> {
    let mut entropy = [0u8; STATE_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| AuthError::RandomUnavailable(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(entropy))
}
