//! Token exchange - RFC 6749 Section 4.1.3 with PKCE.
//!
//! Exchanges an authorization code plus the stored code verifier for
//! tokens at `/oauth/token`. The verifier is consumed by value: whatever
//! the outcome, it is gone after the call and the flow cannot be retried
//! with the same pair.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};

/// OAuth 2.0 grant types used by this SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code grant (RFC 6749 Section 4.1)
    AuthorizationCode,
    /// Refresh token grant (RFC 6749 Section 6)
    RefreshToken,
}

/// Body of a token endpoint request.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: GrantType,
    client_id: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: GrantType,
    client_id: &'a str,
    refresh_token: &'a str,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Access token for bearer authentication against the backend
    pub access_token: String,
    /// Token type (`Bearer`)
    pub token_type: String,
    /// Refresh token, when the server issues one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Granted scope, when it differs from the requested one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Client for the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    endpoint: Url,
    client_id: String,
    redirect_uri: String,
}

impl TokenClient {
    /// Build a token client for the configured backend.
    ///
    /// # Errors
    ///
    /// Fails when the token endpoint URL cannot be derived from the
    /// backend base URL.
    pub fn new(config: &ClientConfig) -> AuthResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.base_url.join("/oauth/token")?,
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// Use an existing HTTP client (connection pooling across the SDK).
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Exchange an authorization code for tokens.
    ///
    /// The verifier is consumed regardless of outcome; a failed exchange
    /// requires a whole new authorization request.
    ///
    /// # Errors
    ///
    /// Non-2xx responses surface the backend's `error` and
    /// `error_description` verbatim via [`AuthError::Backend`], so
    /// callers can branch on codes such as `invalid_grant`.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: SecretString,
    ) -> AuthResult<TokenResponse> {
        let body = TokenRequest {
            grant_type: GrantType::AuthorizationCode,
            client_id: &self.client_id,
            code,
            redirect_uri: &self.redirect_uri,
            code_verifier: verifier.expose_secret(),
        };

        debug!(endpoint = %self.endpoint, "exchanging authorization code");
        let response = self.http.post(self.endpoint.clone()).json(&body).send().await?;
        Self::parse_response(response).await
    }

    /// Refresh an access token.
    ///
    /// When the server rotates refresh tokens, the response carries a new
    /// one and the old token must be discarded.
    ///
    /// # Errors
    ///
    /// Same surface as [`exchange_code`](Self::exchange_code).
    pub async fn refresh(&self, refresh_token: &SecretString) -> AuthResult<TokenResponse> {
        let body = RefreshRequest {
            grant_type: GrantType::RefreshToken,
            client_id: &self.client_id,
            refresh_token: refresh_token.expose_secret(),
        };

        let response = self.http.post(self.endpoint.clone()).json(&body).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response(response: reqwest::Response) -> AuthResult<TokenResponse> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::from_backend_body(status.as_u16(), &body))
    }
}
