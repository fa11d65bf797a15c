//! # Kimlik Connect - OAuth 2.0 + PKCE client SDK
//!
//! Client-side implementation of the Kimlik identity/wallet platform's
//! OAuth 2.0 Authorization Code flow with PKCE (RFC 7636), covering the
//! embeddable login widget, the consent/charge/topup decision pages and
//! token exchange.
//!
//! ## Design Principles
//!
//! - **Fresh secrets per attempt**: every authorization request generates
//!   a new `state` and PKCE pair; both are consumed exactly once
//! - **Explicit lifecycles**: popups, message listeners and timers are
//!   owned by a single session and torn down together - nothing ambient,
//!   nothing leaked
//! - **Server-authoritative flags**: expiry, approvability and balance
//!   sufficiency come from the backend and are never re-derived
//! - **Typed boundaries**: every backend JSON shape is narrowed into a
//!   concrete type immediately after fetch
//!
//! ## Architecture
//!
//! - [`pkce`] - code verifier/challenge generation (RFC 7636, S256 only)
//! - [`authorize`] - authorization request builder
//! - [`flow`] - single-use pending flow (state + verifier)
//! - [`transport`] - host-provided popup/redirect window operations
//! - [`bridge`] - origin-checked, exactly-once cross-window messages
//! - [`session`] - one-owner orchestration of a full attempt
//! - [`token`] - authorization-code and refresh-token exchange
//! - [`api`] - typed REST client for the backend's OAuth endpoints
//! - [`controller`] - consent/charge/topup page state machines
//! - [`widget`] - the embeddable login widget surface
//! - [`i18n`] - localized messages for known error codes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kimlik_connect::widget::{Widget, WidgetConfig};
//! use kimlik_connect::transport::UserAgent;
//!
//! # async fn example(user_agent: Arc<dyn UserAgent>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = WidgetConfig::new(
//!     "my-client-id",
//!     "https://partner.example/callback",
//!     "kimlik-login",
//! )
//! .with_scopes(vec!["profile".to_string(), "wallet".to_string()]);
//!
//! let mut widget = Widget::init(config, user_agent)?;
//! widget.on_event(|event| println!("widget event: {event:?}"));
//!
//! // The host shell feeds window messages into this channel.
//! let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! if let Some(event) = widget.login(rx).await {
//!     println!("login finished: {event:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Standards
//!
//! - **RFC 6749** - OAuth 2.0 Authorization Framework
//! - **RFC 7636** - Proof Key for Code Exchange (PKCE)

// Submodules
pub mod api;
pub mod authorize;
pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod flow;
pub mod i18n;
pub mod pkce;
pub mod session;
pub mod token;
pub mod transport;
pub mod widget;

// Re-export the types most integrations need
#[doc(inline)]
pub use config::ClientConfig;

#[doc(inline)]
pub use error::{AuthError, AuthResult, OAuthErrorBody};

#[doc(inline)]
pub use authorize::{AuthorizationRequest, AuthorizeParams};

#[doc(inline)]
pub use bridge::{BridgeEvent, MessageBridge, WindowMessage};

#[doc(inline)]
pub use session::{AuthOutcome, AuthSession, SessionOptions};

#[doc(inline)]
pub use token::{TokenClient, TokenResponse};

#[doc(inline)]
pub use transport::{OpenMode, PopupOptions, UserAgent, WindowHandle};

#[doc(inline)]
pub use widget::{Widget, WidgetConfig, WidgetEvent};

#[doc(inline)]
pub use i18n::Locale;
