//! Embeddable login widget surface.
//!
//! The Rust counterpart of the platform's drop-in login button: one
//! factory producing an instance that owns its configuration, transport
//! and listeners, with an explicit init/teardown lifecycle instead of
//! ambient globals. DOM `kimlik:success` / `kimlik:error` CustomEvents
//! become a typed callback registry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult};
use crate::i18n::{error_message, localized_message, Locale};
use crate::session::{AuthOutcome, AuthSession, SessionOptions};
use crate::token::{TokenClient, TokenResponse};
use crate::transport::{OpenMode, PopupOptions, UserAgent};
use crate::bridge::WindowMessage;

use tokio::sync::mpsc;

/// Widget color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light backgrounds
    Light,
    /// Dark backgrounds
    Dark,
    /// Follow the host page's preference
    #[default]
    Auto,
}

/// Widget button size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    /// Compact button
    Small,
    /// Standard button
    #[default]
    Medium,
    /// Prominent button
    Large,
}

fn default_base_url() -> Url {
    // Platform default; overridable for staging environments.
    Url::parse("https://id.kimlik.az").expect("hard-coded URL is valid")
}

fn default_popup() -> bool {
    true
}

fn default_popup_width() -> u32 {
    PopupOptions::default().width
}

fn default_popup_height() -> u32 {
    PopupOptions::default().height
}

/// Configuration surface of the embeddable widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Client identifier
    pub client_id: String,
    /// Registered redirect URI
    pub redirect_uri: String,
    /// Id of the container element the widget renders into
    pub container_id: String,
    /// Scopes to request
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Color theme
    #[serde(default)]
    pub theme: Theme,
    /// Button size
    #[serde(default)]
    pub size: WidgetSize,
    /// Interface locale
    #[serde(default)]
    pub locale: Locale,
    /// Popup flow (`true`) or full-page redirect (`false`)
    #[serde(default = "default_popup")]
    pub popup: bool,
    /// Popup width in pixels
    #[serde(default = "default_popup_width")]
    pub popup_width: u32,
    /// Popup height in pixels
    #[serde(default = "default_popup_height")]
    pub popup_height: u32,
    /// Backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: Url,
}

impl WidgetConfig {
    /// Minimal configuration with platform defaults for everything else.
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            container_id: container_id.into(),
            scopes: Vec::new(),
            theme: Theme::default(),
            size: WidgetSize::default(),
            locale: Locale::default(),
            popup: default_popup(),
            popup_width: default_popup_width(),
            popup_height: default_popup_height(),
            base_url: default_base_url(),
        }
    }

    /// Set the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the interface locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Target a different backend (staging, local development).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Use a full-page redirect instead of the popup flow.
    pub fn with_redirect_flow(mut self) -> Self {
        self.popup = false;
        self
    }
}

/// Events emitted to widget listeners, mirroring the `kimlik:success` /
/// `kimlik:error` CustomEvents of the embeddable script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WidgetEvent {
    /// Login completed; tokens were exchanged successfully
    #[serde(rename = "kimlik:success")]
    Success {
        /// The issued tokens
        token: TokenResponse,
    },
    /// Login failed or was abandoned
    #[serde(rename = "kimlik:error")]
    Error {
        /// Stable error code (`access_denied`, `popup_blocked`, ...)
        code: String,
        /// Message in the widget's configured locale, or the backend's
        /// own description when the code is not in the table
        message: String,
    },
}

type Listener = Box<dyn Fn(&WidgetEvent) + Send + Sync>;

/// A configured widget instance owning its listeners and transport.
pub struct Widget {
    config: WidgetConfig,
    client: ClientConfig,
    token_client: TokenClient,
    user_agent: Arc<dyn UserAgent>,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("client_id", &self.config.client_id)
            .field("container_id", &self.config.container_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Widget {
    /// Initialize a widget instance.
    ///
    /// # Errors
    ///
    /// Fails when the configuration carries an invalid base or redirect
    /// URL.
    pub fn init(config: WidgetConfig, user_agent: Arc<dyn UserAgent>) -> AuthResult<Self> {
        let client = ClientConfig::new(
            config.client_id.clone(),
            config.base_url.as_str(),
            config.redirect_uri.clone(),
        )?
        .with_scopes(config.scopes.clone());
        let token_client = TokenClient::new(&client)?;

        debug!(client_id = %config.client_id, container = %config.container_id, "widget initialized");
        Ok(Self {
            config,
            client,
            token_client,
            user_agent,
            listeners: Vec::new(),
        })
    }

    /// Register a listener for widget events.
    pub fn on_event(&mut self, listener: impl Fn(&WidgetEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// The widget's configuration.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Session tuning derived from the widget configuration.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            mode: if self.config.popup {
                OpenMode::Popup
            } else {
                OpenMode::Redirect
            },
            popup: PopupOptions {
                width: self.config.popup_width,
                height: self.config.popup_height,
            },
            ..SessionOptions::default()
        }
    }

    /// Run the full login flow: authorization request, popup + message
    /// bridge, token exchange.
    ///
    /// Returns the emitted event, or `None` in redirect mode where the
    /// page navigates away and the flow resumes at the redirect URI.
    /// Every returned event is also delivered to registered listeners.
    pub async fn login(
        &self,
        messages: mpsc::UnboundedReceiver<WindowMessage>,
    ) -> Option<WidgetEvent> {
        let event = match self.run_login(messages).await {
            Ok(Some(token)) => WidgetEvent::Success { token },
            Ok(None) => return None,
            Err(error) => self.error_event(&error),
        };
        self.emit(&event);
        Some(event)
    }

    async fn run_login(
        &self,
        messages: mpsc::UnboundedReceiver<WindowMessage>,
    ) -> AuthResult<Option<TokenResponse>> {
        let mut session = AuthSession::open(
            &self.client,
            self.user_agent.as_ref(),
            self.session_options(),
            messages,
        )?;

        match session.run().await? {
            AuthOutcome::Authorized { code } => {
                let mut pending = session.into_pending();
                let verifier = pending.take_verifier()?;
                let token = self.token_client.exchange_code(&code, verifier).await?;
                Ok(Some(token))
            }
            AuthOutcome::Redirected => Ok(None),
            AuthOutcome::Denied => Err(AuthError::ConsentDenied),
            AuthOutcome::Cancelled => Err(AuthError::Cancelled),
            other => {
                debug!(?other, "unexpected outcome for a login session");
                Err(AuthError::Cancelled)
            }
        }
    }

    fn error_event(&self, error: &AuthError) -> WidgetEvent {
        let code = error.code();

        let message = match localized_message(self.config.locale, code) {
            Some(localized) => localized.to_string(),
            None => match error {
                AuthError::Backend { body, .. } => body
                    .error_description
                    .clone()
                    .unwrap_or_else(|| error_message(self.config.locale, code).to_string()),
                _ => error_message(self.config.locale, code).to_string(),
            },
        };

        WidgetEvent::Error {
            code: code.to_string(),
            message,
        }
    }

    fn emit(&self, event: &WidgetEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}
