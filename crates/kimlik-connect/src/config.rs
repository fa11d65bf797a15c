//! Client configuration for the Kimlik authorization flows.
//!
//! A [`ClientConfig`] identifies the integrating application (client id,
//! redirect URI, requested scopes) and the backend it talks to. Redirect
//! URIs are validated up front; the message bridge later accepts window
//! messages only from the origin derived from `base_url`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthError, AuthResult};

/// Configuration for an integrating OAuth client application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client identifier issued by the platform
    pub client_id: String,

    /// Redirect URI registered for this client
    pub redirect_uri: String,

    /// Scopes to request (joined with spaces in the authorization request)
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Base URL of the Kimlik backend (e.g. `https://id.kimlik.az`)
    pub base_url: Url,
}

impl ClientConfig {
    /// Create a configuration, validating the backend URL and redirect URI.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when either URL is malformed or the
    /// redirect URI violates the scheme rules below.
    pub fn new(
        client_id: impl Into<String>,
        base_url: &str,
        redirect_uri: impl Into<String>,
    ) -> AuthResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AuthError::Config(format!("invalid base URL: {e}")))?;
        if base_url.host_str().is_none() {
            return Err(AuthError::Config("base URL must have a host".to_string()));
        }

        let redirect_uri = redirect_uri.into();
        validate_redirect_uri(&redirect_uri)?;

        Ok(Self {
            client_id: client_id.into(),
            redirect_uri,
            scopes: Vec::new(),
            base_url,
        })
    }

    /// Set the scopes to request.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// The exact origin (`scheme://host[:port]`) window messages must carry
    /// to be accepted by the message bridge.
    pub fn expected_origin(&self) -> String {
        origin_of(&self.base_url)
    }
}

/// Extract the origin (`scheme://host[:port]`) of a URL. Default ports are
/// omitted, matching what browsers report in `event.origin`.
pub fn origin_of(url: &Url) -> String {
    match url.port() {
        Some(port) => format!(
            "{}://{}:{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            port
        ),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default()),
    }
}

/// Redirect URI validation.
///
/// Rules:
/// - `https` is always allowed
/// - `http` only for localhost loopback hosts (development)
/// - no URL fragment (RFC 6749 Section 3.1.2)
/// - no remaining path traversal segments
pub fn validate_redirect_uri(uri: &str) -> AuthResult<()> {
    let parsed =
        Url::parse(uri).map_err(|e| AuthError::Config(format!("invalid redirect URI: {e}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" => {
            let host = parsed
                .host_str()
                .ok_or_else(|| AuthError::Config("redirect URI must have a host".to_string()))?;
            let is_loopback =
                host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";
            if !is_loopback {
                return Err(AuthError::Config(
                    "http redirect URIs are only allowed for localhost".to_string(),
                ));
            }
        }
        scheme => {
            return Err(AuthError::Config(format!(
                "unsupported redirect URI scheme: {scheme}"
            )));
        }
    }

    if parsed.fragment().is_some() {
        return Err(AuthError::Config(
            "redirect URI must not contain a fragment".to_string(),
        ));
    }

    if let Some(segments) = parsed.path_segments() {
        for segment in segments {
            if segment == ".." {
                return Err(AuthError::Config(
                    "redirect URI path must not contain traversal segments".to_string(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_redirect_is_accepted() {
        assert!(validate_redirect_uri("https://partner.example/callback").is_ok());
    }

    #[test]
    fn http_is_localhost_only() {
        assert!(validate_redirect_uri("http://localhost:3000/cb").is_ok());
        assert!(validate_redirect_uri("http://127.0.0.1/cb").is_ok());
        assert!(validate_redirect_uri("http://partner.example/cb").is_err());
    }

    #[test]
    fn fragments_and_custom_schemes_are_rejected() {
        assert!(validate_redirect_uri("https://partner.example/cb#frag").is_err());
        assert!(validate_redirect_uri("myapp://callback").is_err());
    }

    #[test]
    fn origin_drops_default_port_and_path() {
        let config = ClientConfig::new(
            "abc",
            "https://id.kimlik.az/some/path",
            "https://partner.example/callback",
        )
        .expect("valid config");
        assert_eq!(config.expected_origin(), "https://id.kimlik.az");

        let dev = ClientConfig::new("abc", "http://localhost:8080", "http://localhost:3000/cb")
            .expect("valid config");
        assert_eq!(dev.expected_origin(), "http://localhost:8080");
    }
}
