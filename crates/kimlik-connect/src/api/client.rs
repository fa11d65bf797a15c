//! Bearer-authenticated HTTP client for the Kimlik backend.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::authorize::AuthorizeParams;
use crate::error::{AuthError, AuthResult};

use super::types::{
    ChargeContext, ChargeDecisionRequest, ConsentContext, ConsentDecisionRequest, Decision,
    DecisionRedirect, TopupContext, TopupReceipt, UserProfile,
};

/// HTTP client for the backend's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    bearer: Option<SecretString>,
}

impl BackendClient {
    /// Create a client against a backend base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bearer: None,
        }
    }

    /// Attach the user's access token for authenticated endpoints.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(SecretString::new(token.into()));
        self
    }

    /// Use an existing HTTP client.
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Login URL carrying `return_to` so an unauthenticated flow can
    /// resume where it left off.
    ///
    /// # Errors
    ///
    /// Fails when the base URL cannot be joined with the login path.
    pub fn login_url(&self, return_to: &Url) -> AuthResult<Url> {
        let mut url = self.base_url.join("/login")?;
        url.query_pairs_mut()
            .append_pair("return_to", return_to.as_str());
        Ok(url)
    }

    /// Fetch the consent context for an authorization request.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn consent_context(&self, params: &AuthorizeParams) -> AuthResult<ConsentContext> {
        let mut url = self.base_url.join("/oauth/authorize")?;
        params.apply_to(&mut url);
        let response = self.get(url).send().await?;
        self.read(response).await
    }

    /// Submit the user's consent decision with the exact parameters the
    /// context was fetched with.
    ///
    /// # Errors
    ///
    /// Backend errors surface verbatim; the caller decides retryability.
    pub async fn submit_consent(
        &self,
        params: &AuthorizeParams,
        decision: Decision,
    ) -> AuthResult<DecisionRedirect> {
        let url = self.base_url.join("/oauth/authorize")?;
        let body = ConsentDecisionRequest {
            params: params.clone(),
            decision,
        };
        debug!(decision = ?decision, "submitting consent decision");
        let response = self.post(url).json(&body).send().await?;
        self.read(response).await
    }

    /// Fetch the user profile granted to the calling application.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn user_profile(&self) -> AuthResult<UserProfile> {
        let url = self.base_url.join("/oauth/user")?;
        let response = self.get(url).send().await?;
        self.read(response).await
    }

    /// Fetch the approval context for a charge.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn charge_context(&self, charge_id: &str) -> AuthResult<ChargeContext> {
        let url = self
            .base_url
            .join(&format!("/oauth/approve/{charge_id}"))?;
        let response = self.get(url).send().await?;
        self.read(response).await
    }

    /// Submit a charge decision.
    ///
    /// # Errors
    ///
    /// Backend errors surface verbatim; the caller decides retryability.
    pub async fn submit_charge_decision(
        &self,
        charge_id: &str,
        request: &ChargeDecisionRequest,
    ) -> AuthResult<()> {
        let url = self
            .base_url
            .join(&format!("/oauth/approve/{charge_id}"))?;
        debug!(charge_id, decision = ?request.decision, "submitting charge decision");
        let response = self.post(url).json(request).send().await?;
        self.read_empty(response).await
    }

    /// Fetch the topup context for a client application.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] on 401; backend errors otherwise.
    pub async fn topup_context(&self, client_id: &str) -> AuthResult<TopupContext> {
        let mut url = self.base_url.join("/oauth/topup-info")?;
        url.query_pairs_mut().append_pair("client_id", client_id);
        let response = self.get(url).send().await?;
        self.read(response).await
    }

    /// Create a topup charge.
    ///
    /// # Errors
    ///
    /// Backend errors surface verbatim; the caller decides retryability.
    pub async fn submit_topup(&self, client_id: &str, amount: f64) -> AuthResult<TopupReceipt> {
        let url = self.base_url.join("/oauth/topup")?;
        let body = serde_json::json!({ "client_id": client_id, "amount": amount });
        let response = self.post(url).json(&body).send().await?;
        self.read(response).await
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(url))
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(url))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(&self, response: reqwest::Response) -> AuthResult<T> {
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

    async fn read_empty(&self, response: reqwest::Response) -> AuthResult<()> {
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
}
