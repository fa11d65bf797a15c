//! Application management request/response shapes.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// A registered OAuth application, as returned by listings.
///
/// Listings never carry the plaintext secret; `secret_hint` is the
/// masked tail the dashboard shows (e.g. `****c4f2`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthApp {
    /// Client identifier
    pub client_id: String,
    /// Display name
    pub name: String,
    /// Logo shown on consent screens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Application homepage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// Registered redirect URIs
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Scopes the application may request
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    /// Whether the application holds a client secret
    #[serde(default)]
    pub is_confidential: bool,
    /// Whether the application can currently run flows
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Masked tail of the secret, for display only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_hint: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Payload for creating or updating an application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppRequest {
    /// Display name
    pub name: String,
    /// Logo shown on consent screens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Application homepage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// Redirect URIs to register
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Scopes the application may request
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    /// Request a confidential client (with a secret)
    #[serde(default)]
    pub is_confidential: bool,
}

impl AppRequest {
    /// A minimal request with just a display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logo_url: None,
            website_url: None,
            redirect_uris: Vec::new(),
            allowed_scopes: Vec::new(),
            is_confidential: false,
        }
    }

    /// Set the redirect URIs.
    pub fn with_redirect_uris(mut self, uris: Vec<String>) -> Self {
        self.redirect_uris = uris;
        self
    }

    /// Set the allowed scopes.
    pub fn with_allowed_scopes(mut self, scopes: Vec<String>) -> Self {
        self.allowed_scopes = scopes;
        self
    }

    /// Set the logo URL.
    pub fn with_logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    /// Set the homepage URL.
    pub fn with_website_url(mut self, url: impl Into<String>) -> Self {
        self.website_url = Some(url.into());
        self
    }

    /// Request a confidential client.
    pub fn confidential(mut self) -> Self {
        self.is_confidential = true;
        self
    }
}

/// Response to creation or secret regeneration: the application plus its
/// plaintext secret, delivered exactly this once.
#[derive(Debug, Deserialize)]
pub struct CreatedApp {
    /// The registered application
    #[serde(flatten)]
    pub app: OAuthApp,
    /// The plaintext secret; store it now, it is never shown again
    pub client_secret: SecretString,
}
