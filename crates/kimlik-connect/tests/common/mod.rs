//! Common test utilities for integration tests.
//!
//! Provides a wiremock-backed Kimlik backend with the OAuth endpoints the
//! SDK consumes, plus fake window/user-agent implementations for driving
//! popup flows without a browser.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use kimlik_connect::config::ClientConfig;
use kimlik_connect::error::{AuthError, AuthResult};
use kimlik_connect::transport::{PopupOptions, UserAgent, WindowHandle};

/// Mock Kimlik backend configuration.
pub struct MockKimlikBackend {
    pub server: MockServer,
}

impl MockKimlikBackend {
    /// Start a mock backend.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock backend.
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// A client configuration pointing at this backend.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(
            "test-client",
            &self.base_url(),
            "https://partner.example/callback",
        )
        .expect("valid test config")
        .with_scopes(vec!["profile".to_string(), "wallet".to_string()])
    }

    /// The origin the SDK expects window messages from.
    pub fn origin(&self) -> String {
        self.client_config().expected_origin()
    }

    /// Mock a successful token endpoint response.
    pub async fn mock_token_success(&self, access_token: &str, refresh_token: Option<&str>) {
        let mut body = json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "profile wallet",
        });
        if let Some(refresh) = refresh_token {
            body["refresh_token"] = json!(refresh);
        }

        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock a token endpoint error response.
    pub async fn mock_token_error(&self, error: &str, description: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": error,
                "error_description": description,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the consent context endpoint.
    pub async fn mock_consent_context(&self) {
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(consent_context_body()))
            .mount(&self.server)
            .await;
    }

    /// Mock the consent context endpoint as unauthenticated.
    pub async fn mock_consent_context_unauthenticated(&self) {
        Mock::given(method("GET"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Unauthenticated."
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the consent decision endpoint.
    pub async fn mock_consent_decision(&self, redirect_uri: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "redirect_uri": redirect_uri,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the charge context endpoint with the given charge body.
    pub async fn mock_charge_context(&self, charge_id: &str, charge: serde_json::Value, wallet: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/oauth/approve/{charge_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "charge": charge,
                "client": client_summary_body(),
                "wallet": wallet,
                "auto_approve": {"enabled": false},
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the charge decision endpoint.
    pub async fn mock_charge_decision_ok(&self, charge_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/oauth/approve/{charge_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&self.server)
            .await;
    }

    /// Mock the topup info and creation endpoints.
    pub async fn mock_topup(&self, charge_id: &str) {
        Mock::given(method("GET"))
            .and(path("/oauth/topup-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "client": client_summary_body(),
                "wallet": {"balance": 12.5, "currency": "AZN", "sufficient": true},
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/oauth/topup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "charge_id": charge_id,
            })))
            .mount(&self.server)
            .await;
    }

    /// All requests the token endpoint received.
    pub async fn token_requests(&self) -> Vec<Request> {
        self.requests_to("/oauth/token").await
    }

    /// All requests a path received.
    pub async fn requests_to(&self, path_filter: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == path_filter)
            .collect()
    }
}

/// Consent context JSON in the backend's wire shape.
pub fn consent_context_body() -> serde_json::Value {
    json!({
        "client": client_summary_body(),
        "scopes": [
            {
                "name": "profile",
                "display_name": {"az": "Profil məlumatları", "en": "Profile information"},
                "description": {"en": "Read your basic profile"},
                "category": "identity"
            },
            {
                "name": "wallet",
                "display_name": {"en": "Wallet"},
                "description": {},
                "category": "wallet"
            }
        ],
        "user": {"id": "u_1", "name": "Aysel Quliyeva", "email": "aysel@example.com"}
    })
}

/// Client summary JSON in the backend's wire shape.
pub fn client_summary_body() -> serde_json::Value {
    json!({
        "client_id": "test-client",
        "name": "Test Partner",
        "logo_url": "https://partner.example/logo.png",
        "website_url": "https://partner.example"
    })
}

/// A pending charge the user can approve.
pub fn approvable_charge(charge_id: &str) -> serde_json::Value {
    json!({
        "id": charge_id,
        "amount": 4.99,
        "currency": "AZN",
        "description": "Premium subscription",
        "status": "pending",
        "expires_at": "2026-12-31T23:59:59Z",
        "is_expired": false,
        "can_approve": true
    })
}

/// A wallet that covers the charge.
pub fn sufficient_wallet() -> serde_json::Value {
    json!({"balance": 25.0, "currency": "AZN", "sufficient": true})
}

/// Fake popup window backed by a shared closed flag.
pub struct FakeWindow {
    closed: Arc<AtomicBool>,
}

impl WindowHandle for FakeWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Fake user agent recording every open/redirect.
pub struct FakeUserAgent {
    block_popups: bool,
    pub closed: Arc<AtomicBool>,
    opened: Mutex<Vec<Url>>,
    redirects: Mutex<Vec<Url>>,
}

impl FakeUserAgent {
    /// A user agent that opens popups normally.
    pub fn new() -> Self {
        Self {
            block_popups: false,
            closed: Arc::new(AtomicBool::new(false)),
            opened: Mutex::new(Vec::new()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// A user agent with a popup blocker.
    pub fn blocking() -> Self {
        Self {
            block_popups: true,
            ..Self::new()
        }
    }

    /// Simulate the user closing the popup.
    pub fn close_popup(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// The last URL opened in a popup.
    pub fn last_opened(&self) -> Option<Url> {
        self.opened.lock().expect("lock").last().cloned()
    }

    /// The last full-page navigation.
    pub fn last_redirect(&self) -> Option<Url> {
        self.redirects.lock().expect("lock").last().cloned()
    }

    /// How many popups were opened.
    pub fn popup_count(&self) -> usize {
        self.opened.lock().expect("lock").len()
    }
}

impl UserAgent for FakeUserAgent {
    fn open_popup(&self, url: &Url, _options: &PopupOptions) -> AuthResult<Box<dyn WindowHandle>> {
        if self.block_popups {
            return Err(AuthError::PopupBlocked);
        }
        self.opened.lock().expect("lock").push(url.clone());
        Ok(Box::new(FakeWindow {
            closed: self.closed.clone(),
        }))
    }

    fn redirect(&self, url: &Url) -> AuthResult<()> {
        self.redirects.lock().expect("lock").push(url.clone());
        Ok(())
    }
}
