//! HTTP client for the application management endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use kimlik_connect::api::types::ScopeInfo;
use kimlik_connect::error::{AuthError, AuthResult};

use crate::types::{AppRequest, CreatedApp, OAuthApp};

/// Bearer-authenticated client for `/oauth/apps` and `/oauth/scopes`.
#[derive(Debug, Clone)]
pub struct AppsClient {
    http: reqwest::Client,
    base_url: Url,
    bearer: SecretString,
}

impl AppsClient {
    /// Create a client with the developer's access token.
    pub fn new(base_url: Url, bearer: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bearer: SecretString::new(bearer.into()),
        }
    }

    /// Use an existing HTTP client.
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// List the developer's applications. Secrets are masked.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn list(&self) -> AuthResult<Vec<OAuthApp>> {
        let url = self.base_url.join("/oauth/apps")?;
        self.read(self.http.get(url)).await
    }

    /// Fetch one application.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn get(&self, client_id: &str) -> AuthResult<OAuthApp> {
        let url = self.base_url.join(&format!("/oauth/apps/{client_id}"))?;
        self.read(self.http.get(url)).await
    }

    /// Register a new application.
    ///
    /// The response carries the plaintext secret exactly once (for
    /// confidential clients); it can never be fetched again.
    ///
    /// # Errors
    ///
    /// Backend validation errors surface verbatim.
    pub async fn create(&self, request: &AppRequest) -> AuthResult<CreatedApp> {
        let url = self.base_url.join("/oauth/apps")?;
        debug!(name = %request.name, "registering application");
        self.read(self.http.post(url).json(request)).await
    }

    /// Update an application's metadata.
    ///
    /// # Errors
    ///
    /// Backend validation errors surface verbatim.
    pub async fn update(&self, client_id: &str, request: &AppRequest) -> AuthResult<OAuthApp> {
        let url = self.base_url.join(&format!("/oauth/apps/{client_id}"))?;
        self.read(self.http.put(url).json(request)).await
    }

    /// Delete an application. Existing tokens are revoked server-side.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn delete(&self, client_id: &str) -> AuthResult<()> {
        let url = self.base_url.join(&format!("/oauth/apps/{client_id}"))?;
        let response = self.authed(self.http.delete(url)).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthenticated);
        }
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::from_backend_body(status.as_u16(), &body))
    }

    /// Rotate an application's secret.
    ///
    /// The old secret stops working immediately; the new one is returned
    /// in plaintext exactly this once.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn regenerate_secret(&self, client_id: &str) -> AuthResult<CreatedApp> {
        let url = self
            .base_url
            .join(&format!("/oauth/apps/{client_id}/regenerate-secret"))?;
        debug!(client_id, "regenerating application secret");
        self.read(self.http.post(url)).await
    }

    /// Fetch the platform's scope catalog.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn scopes(&self) -> AuthResult<Vec<ScopeInfo>> {
        let url = self.base_url.join("/oauth/scopes")?;
        self.read(self.http.get(url)).await
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(self.bearer.expose_secret())
    }

    async fn read<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> AuthResult<T> {
        let response = self.authed(builder).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthenticated);
        }
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AuthError::from_backend_body(status.as_u16(), &body))
    }
}
