//! Property-based tests for PKCE generation and the authorization
//! request builder.
//!
//! Uses proptest to verify invariants of:
//! - Code verifier grammar (RFC 7636 Section 4.1)
//! - Challenge derivation (BASE64URL(SHA256(verifier)))
//! - State/verifier freshness across builder calls

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use proptest::prelude::*;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use kimlik_connect::authorize::AuthorizationRequest;
use kimlik_connect::config::ClientConfig;
use kimlik_connect::pkce::{derive_challenge, is_valid_verifier, PkcePair};

fn test_config() -> ClientConfig {
    ClientConfig::new(
        "prop-client",
        "https://id.kimlik.az",
        "https://partner.example/callback",
    )
    .expect("valid config")
}

/// Strategy producing strings from the RFC 7636 unreserved alphabet.
fn verifier_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9\\-._~]{43,128}").expect("valid regex")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: challenge derivation is exactly BASE64URL(SHA256(v))
    #[test]
    fn prop_challenge_is_b64url_sha256(verifier in verifier_strategy()) {
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        prop_assert_eq!(derive_challenge(&verifier), expected);
    }

    /// Property: the unreserved alphabet is accepted, anything longer,
    /// shorter or outside it is rejected
    #[test]
    fn prop_grammar_accepts_unreserved(verifier in verifier_strategy()) {
        prop_assert!(is_valid_verifier(&verifier));
    }

    #[test]
    fn prop_grammar_rejects_reserved_chars(
        verifier in verifier_strategy(),
        bad in "[+/=%#?& ]"
    ) {
        let mut corrupted = verifier;
        corrupted.push_str(&bad);
        // Still within length bounds for most cases; the charset alone
        // must cause rejection
        if corrupted.len() <= 128 {
            prop_assert!(!is_valid_verifier(&corrupted));
        }
    }
}

#[test]
fn generated_verifiers_satisfy_the_grammar() {
    for _ in 0..64 {
        let pair = PkcePair::generate().expect("OS RNG available");
        let challenge = pair.challenge().to_string();
        let verifier = pair.into_verifier();
        assert!(is_valid_verifier(verifier.expose_secret()));
        assert_eq!(derive_challenge(verifier.expose_secret()), challenge);
    }
}

#[test]
fn builder_never_repeats_state_or_verifier() {
    let config = test_config();
    let mut states = std::collections::HashSet::new();
    let mut challenges = std::collections::HashSet::new();

    for _ in 0..64 {
        let request = AuthorizationRequest::new(&config).expect("request");
        assert!(
            states.insert(request.params().state.clone()),
            "state repeated across authorization requests"
        );
        assert!(
            challenges.insert(request.params().code_challenge.clone()),
            "code challenge repeated across authorization requests"
        );
    }
}
