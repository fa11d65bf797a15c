//! # Kimlik Connect Apps - developer application management
//!
//! Client for the platform's developer-facing OAuth application
//! endpoints: registering applications, rotating secrets and browsing
//! the scope catalog.
//!
//! ## Secret handling
//!
//! A client secret is returned in plaintext exactly once, on creation or
//! regeneration, wrapped in [`secrecy::SecretString`]. Listings only
//! ever carry a masked hint; there is no way to read a secret back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kimlik_connect_apps::{AppRequest, AppsClient};
//! use secrecy::ExposeSecret;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AppsClient::new(
//!     url::Url::parse("https://id.kimlik.az")?,
//!     "developer-access-token",
//! );
//!
//! let request = AppRequest::new("My Shop")
//!     .with_redirect_uris(vec!["https://shop.example/callback".to_string()])
//!     .with_allowed_scopes(vec!["profile".to_string(), "wallet".to_string()]);
//!
//! let created = client.create(&request).await?;
//! // Show the secret to the developer now; it cannot be fetched again.
//! println!("client_secret: {}", created.client_secret.expose_secret());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

#[doc(inline)]
pub use client::AppsClient;

#[doc(inline)]
pub use types::{AppRequest, CreatedApp, OAuthApp};

// The error surface is shared with the core SDK
pub use kimlik_connect::error::{AuthError, AuthResult};
