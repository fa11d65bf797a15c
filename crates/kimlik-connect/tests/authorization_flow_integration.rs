//! Integration tests for the authorization code flow with PKCE.
//!
//! These tests drive the full client-side protocol against a mock
//! backend: request building, popup transport, the cross-window message
//! bridge, state validation and token exchange.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use common::{FakeUserAgent, MockKimlikBackend};
use kimlik_connect::bridge::WindowMessage;
use kimlik_connect::error::AuthError;
use kimlik_connect::pkce::derive_challenge;
use kimlik_connect::session::{AuthOutcome, AuthSession, SessionOptions};
use kimlik_connect::token::TokenClient;

fn fast_options() -> SessionOptions {
    SessionOptions {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
        ..SessionOptions::default()
    }
}

fn query_map(url: &url::Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

#[tokio::test]
async fn happy_path_authorizes_and_exchanges_with_original_verifier() {
    // GIVEN: A mock backend and an opened authorization session
    let backend = MockKimlikBackend::start().await;
    backend.mock_token_success("at_123", Some("rt_456")).await;

    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (tx, rx) = mpsc::unbounded_channel();

    let mut session =
        AuthSession::open(&config, &user_agent, fast_options(), rx).expect("session opens");

    // The popup URL carries the full parameter set
    let popup_url = user_agent.last_opened().expect("popup opened");
    let query = query_map(&popup_url);
    assert_eq!(query["client_id"], "test-client");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["code_challenge_method"], "S256");
    assert_eq!(query["scope"], "profile wallet");
    let state = query["state"].clone();
    let challenge = query["code_challenge"].clone();

    // WHEN: The consent window signals success with the matching state
    tx.send(WindowMessage::new(
        backend.origin(),
        json!({
            "type": "oauth_success",
            "redirect_uri": format!("https://partner.example/callback?code=C123&state={state}"),
        }),
    ))
    .expect("send");

    let outcome = session.run().await.expect("flow resolves");

    // THEN: The code is extracted and the popup is closed
    assert_eq!(
        outcome,
        AuthOutcome::Authorized {
            code: "C123".to_string()
        }
    );

    // AND: Token exchange uses the verifier matching the challenge
    let verifier = session
        .into_pending()
        .take_verifier()
        .expect("verifier available exactly once");

    let token_client = TokenClient::new(&config).expect("token client");
    let token = token_client
        .exchange_code("C123", verifier)
        .await
        .expect("exchange succeeds");
    assert_eq!(token.access_token, "at_123");
    assert_eq!(token.refresh_token.as_deref(), Some("rt_456"));

    let requests = backend.token_requests().await;
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert_eq!(body["grant_type"], "authorization_code");
    assert_eq!(body["code"], "C123");
    let sent_verifier = body["code_verifier"].as_str().expect("verifier sent");
    assert_eq!(derive_challenge(sent_verifier), challenge);
}

#[tokio::test]
async fn state_mismatch_aborts_without_token_exchange() {
    // GIVEN: An opened session
    let backend = MockKimlikBackend::start().await;
    backend.mock_token_success("at_123", None).await;

    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut session =
        AuthSession::open(&config, &user_agent, fast_options(), rx).expect("session opens");

    // WHEN: Success arrives with a state that was never issued
    tx.send(WindowMessage::new(
        backend.origin(),
        json!({
            "type": "oauth_success",
            "redirect_uri": "https://partner.example/callback?code=C123&state=forged",
        }),
    ))
    .expect("send");

    let result = session.run().await;

    // THEN: The flow fails fatally and the verifier is gone
    assert!(matches!(result, Err(AuthError::StateMismatch)));
    assert!(matches!(
        session.into_pending().take_verifier(),
        Err(AuthError::VerifierConsumed)
    ));

    // AND: No token exchange was attempted
    assert!(backend.token_requests().await.is_empty());
}

#[tokio::test]
async fn denied_consent_resolves_without_token_exchange() {
    // GIVEN: An opened session
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut session =
        AuthSession::open(&config, &user_agent, fast_options(), rx).expect("session opens");

    // WHEN: The user denies consent
    tx.send(WindowMessage::new(
        backend.origin(),
        json!({"type": "oauth_denied"}),
    ))
    .expect("send");

    let outcome = session.run().await.expect("flow resolves");

    // THEN: The result is a denial, the popup is closed, no token call
    assert_eq!(outcome, AuthOutcome::Denied);
    assert!(user_agent.closed.load(std::sync::atomic::Ordering::SeqCst));
    assert!(backend.token_requests().await.is_empty());
}

#[tokio::test]
async fn messages_from_foreign_origins_are_ignored() {
    // GIVEN: An opened session
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut session =
        AuthSession::open(&config, &user_agent, fast_options(), rx).expect("session opens");

    // WHEN: A hostile origin tries to deny, then the real origin answers
    tx.send(WindowMessage::new(
        "https://evil.example",
        json!({"type": "oauth_denied"}),
    ))
    .expect("send");
    tx.send(WindowMessage::new(
        backend.origin(),
        json!({"type": "oauth_denied"}),
    ))
    .expect("send");

    let outcome = session.run().await.expect("flow resolves");

    // THEN: Only the legitimate message resolved the flow
    assert_eq!(outcome, AuthOutcome::Denied);
}

#[tokio::test]
async fn blocked_popup_fails_synchronously() {
    // GIVEN: A user agent with a popup blocker
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::blocking();
    let (_tx, rx) = mpsc::unbounded_channel();

    // WHEN: We try to open the session
    let result = AuthSession::open(&config, &user_agent, fast_options(), rx);

    // THEN: The error is immediate; no popup, no polling ever started
    assert!(matches!(result, Err(AuthError::PopupBlocked)));
    assert_eq!(user_agent.popup_count(), 0);
}

#[tokio::test]
async fn closing_the_popup_cancels_the_flow() {
    // GIVEN: An opened session
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (_tx, rx) = mpsc::unbounded_channel();
    let mut session =
        AuthSession::open(&config, &user_agent, fast_options(), rx).expect("session opens");

    // WHEN: The user closes the popup without completing the flow
    user_agent.close_popup();

    let outcome = session.run().await.expect("flow resolves");

    // THEN: The pending operation resolves as cancelled, not left hanging
    assert_eq!(outcome, AuthOutcome::Cancelled);
}

#[tokio::test]
async fn queued_message_wins_over_close_detection() {
    // GIVEN: An opened session whose popup closed right after posting
    // its result (the normal success sequence)
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let mut session =
        AuthSession::open(&config, &user_agent, fast_options(), rx).expect("session opens");

    tx.send(WindowMessage::new(
        backend.origin(),
        json!({"type": "oauth_denied"}),
    ))
    .expect("send");
    user_agent.close_popup();

    // WHEN: The session runs with both signals pending
    let outcome = session.run().await.expect("flow resolves");

    // THEN: The message takes precedence over close detection
    assert_eq!(outcome, AuthOutcome::Denied);
}

#[tokio::test]
async fn flow_times_out_when_nothing_answers() {
    // GIVEN: A session with a short deadline
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (_tx, rx) = mpsc::unbounded_channel();
    let options = SessionOptions {
        timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(10),
        ..SessionOptions::default()
    };
    let mut session = AuthSession::open(&config, &user_agent, options, rx).expect("session opens");

    // WHEN: Nobody ever responds
    let result = session.run().await;

    // THEN: The flow resolves with a timeout instead of hanging forever
    assert!(matches!(result, Err(AuthError::Timeout)));
}

#[tokio::test]
async fn redirect_mode_navigates_and_keeps_the_pending_flow() {
    // GIVEN: A session in redirect mode
    let backend = MockKimlikBackend::start().await;
    let config = backend.client_config();
    let user_agent = FakeUserAgent::new();
    let (_tx, rx) = mpsc::unbounded_channel();
    let options = SessionOptions {
        mode: kimlik_connect::transport::OpenMode::Redirect,
        ..fast_options()
    };

    // WHEN: The session opens
    let mut session = AuthSession::open(&config, &user_agent, options, rx).expect("session opens");
    let outcome = session.run().await.expect("resolves immediately");

    // THEN: The page navigated away and the verifier survives for the
    // callback leg of the flow
    assert_eq!(outcome, AuthOutcome::Redirected);
    let redirect = user_agent.last_redirect().expect("redirect happened");
    assert_eq!(redirect.path(), "/oauth/authorize");
    assert!(session.into_pending().take_verifier().is_ok());
}

#[tokio::test]
async fn refresh_rotates_tokens_when_the_server_issues_new_ones() {
    // GIVEN: A backend that rotates refresh tokens
    let backend = MockKimlikBackend::start().await;
    backend
        .mock_token_success("at_fresh", Some("rt_rotated"))
        .await;

    let config = backend.client_config();
    let token_client = TokenClient::new(&config).expect("token client");

    // WHEN: We refresh with the current token
    let refreshed = token_client
        .refresh(&secrecy::SecretString::new("rt_old".to_string()))
        .await
        .expect("refresh succeeds");

    // THEN: The response carries the rotated pair and the request used
    // the refresh grant
    assert_eq!(refreshed.access_token, "at_fresh");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("rt_rotated"));
    let requests = backend.token_requests().await;
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json");
    assert_eq!(body["grant_type"], "refresh_token");
    assert_eq!(body["refresh_token"], "rt_old");
}

#[tokio::test]
async fn token_error_surfaces_backend_code_verbatim() {
    // GIVEN: A backend that rejects the exchange
    let backend = MockKimlikBackend::start().await;
    backend
        .mock_token_error("invalid_grant", "Authorization code is invalid or expired")
        .await;

    let config = backend.client_config();
    let token_client = TokenClient::new(&config).expect("token client");

    // WHEN: We exchange a stale code
    let verifier = secrecy::SecretString::new("a".repeat(43));
    let result = token_client.exchange_code("stale", verifier).await;

    // THEN: The backend's error code and description are preserved
    match result {
        Err(AuthError::Backend { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body.error, "invalid_grant");
            assert_eq!(
                body.error_description.as_deref(),
                Some("Authorization code is invalid or expired")
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
