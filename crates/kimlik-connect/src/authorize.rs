//! Authorization request builder - RFC 6749 Section 4.1 with PKCE.
//!
//! Every [`AuthorizationRequest`] carries a freshly generated `state` and
//! PKCE pair; nothing is ever reused between attempts. The same parameter
//! set that forms the authorization URL is exposed as [`AuthorizeParams`]
//! so the consent controller can submit the user's decision with byte-for-
//! byte identical parameters.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};
use crate::flow::PendingAuthorization;
use crate::pkce::{self, PkcePair};

/// OAuth 2.0 response types supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code response
    Code,
}

impl ResponseType {
    /// Get the response type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
        }
    }
}

/// PKCE code challenge methods (RFC 7636). Only S256 is issued; `plain`
/// is not supported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// SHA-256
    #[serde(rename = "S256")]
    S256,
}

impl CodeChallengeMethod {
    /// Get the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

/// The exact parameter set of an authorization request.
///
/// Used both as the query of the `/oauth/authorize` URL and as the body of
/// the consent decision, so the decision cannot be submitted with
/// parameters that differ from the fetched context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizeParams {
    /// Client identifier
    pub client_id: String,
    /// Registered redirect URI
    pub redirect_uri: String,
    /// Response type (always `code`)
    pub response_type: ResponseType,
    /// Space-joined scope list
    pub scope: String,
    /// Anti-CSRF state parameter
    pub state: String,
    /// PKCE code challenge
    pub code_challenge: String,
    /// PKCE challenge method (always `S256`)
    pub code_challenge_method: CodeChallengeMethod,
}

impl AuthorizeParams {
    /// Append this parameter set to a URL's query string.
    pub fn apply_to(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", self.response_type.as_str())
            .append_pair("scope", &self.scope)
            .append_pair("state", &self.state)
            .append_pair("code_challenge", &self.code_challenge)
            .append_pair("code_challenge_method", self.code_challenge_method.as_str());
    }

    /// Parse a parameter set from the query of a consent-page URL.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when a required parameter is missing
    /// or carries an unsupported value.
    pub fn from_url(url: &Url) -> AuthResult<Self> {
        let mut client_id = None;
        let mut redirect_uri = None;
        let mut scope = None;
        let mut state = None;
        let mut code_challenge = None;
        let mut response_type = None;
        let mut method = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "client_id" => client_id = Some(value.into_owned()),
                "redirect_uri" => redirect_uri = Some(value.into_owned()),
                "scope" => scope = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "code_challenge" => code_challenge = Some(value.into_owned()),
                "response_type" => response_type = Some(value.into_owned()),
                "code_challenge_method" => method = Some(value.into_owned()),
                _ => {}
            }
        }

        let require = |name: &str, value: Option<String>| {
            value.ok_or_else(|| AuthError::Config(format!("missing {name} parameter")))
        };

        if let Some(rt) = &response_type {
            if rt != "code" {
                return Err(AuthError::Config(format!(
                    "unsupported response_type: {rt}"
                )));
            }
        }
        if let Some(m) = &method {
            if m != "S256" {
                return Err(AuthError::Config(format!(
                    "unsupported code_challenge_method: {m}"
                )));
            }
        }

        Ok(Self {
            client_id: require("client_id", client_id)?,
            redirect_uri: require("redirect_uri", redirect_uri)?,
            response_type: ResponseType::Code,
            scope: scope.unwrap_or_default(),
            state: require("state", state)?,
            code_challenge: require("code_challenge", code_challenge)?,
            code_challenge_method: CodeChallengeMethod::S256,
        })
    }
}

/// A fully-formed authorization request: the `/oauth/authorize` URL plus
/// the single-use pending flow holding its `state` and verifier.
#[derive(Debug)]
pub struct AuthorizationRequest {
    url: Url,
    params: AuthorizeParams,
    pending: PendingAuthorization,
}

impl AuthorizationRequest {
    /// Build a request against the configured backend.
    ///
    /// Generates a fresh `state` and PKCE pair on every call; previous
    /// values are never reused.
    ///
    /// # Errors
    ///
    /// Fails if the CSPRNG is unavailable or the backend URL cannot be
    /// joined with the authorize path.
    pub fn new(config: &ClientConfig) -> AuthResult<Self> {
        let state = pkce::generate_state()?;
        let pair = PkcePair::generate()?;

        let params = AuthorizeParams {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            response_type: ResponseType::Code,
            scope: config.scopes.join(" "),
            state: state.clone(),
            code_challenge: pair.challenge().to_string(),
            code_challenge_method: CodeChallengeMethod::S256,
        };

        let mut url = config.base_url.join("/oauth/authorize")?;
        params.apply_to(&mut url);

        Ok(Self {
            url,
            params,
            pending: PendingAuthorization::new(state, pair.into_verifier()),
        })
    }

    /// The URL to open in a popup or navigate to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The exact parameters carried by the URL.
    pub fn params(&self) -> &AuthorizeParams {
        &self.params
    }

    /// Split into the pieces the session needs: the URL and the
    /// single-use pending flow.
    pub fn into_parts(self) -> (Url, PendingAuthorization) {
        (self.url, self.pending)
    }
}
