//! Popup/redirect transport abstraction.
//!
//! The SDK never touches a real window itself; the embedding shell
//! provides a [`UserAgent`] that opens popups and performs full-page
//! navigation. Cross-origin popups cannot be observed through events, so
//! the only lifecycle signal a [`WindowHandle`] offers is `is_closed`,
//! polled by the owning session.

use url::Url;

use crate::error::{AuthError, AuthResult};

/// How the authorization URL is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fixed-size popup window; results arrive via the message bridge
    Popup,
    /// Full-page navigation; the only way back is the backend redirect
    Redirect,
}

/// Popup window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupOptions {
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            width: 480,
            height: 640,
        }
    }
}

/// Handle to an opened authorization window.
pub trait WindowHandle: Send {
    /// Whether the user has closed the window. Polled periodically; there
    /// is no close event for cross-origin windows.
    fn is_closed(&self) -> bool;

    /// Close the window. Must be idempotent.
    fn close(&self);
}

/// Host-provided window operations.
pub trait UserAgent: Send + Sync {
    /// Open `url` in a new popup window.
    ///
    /// # Errors
    ///
    /// Implementations must return [`AuthError::PopupBlocked`]
    /// synchronously when window creation is refused (popup blocker);
    /// callers never start closed-detection polling in that case.
    fn open_popup(&self, url: &Url, options: &PopupOptions) -> AuthResult<Box<dyn WindowHandle>>;

    /// Navigate the current page to `url`, abandoning the local flow.
    ///
    /// # Errors
    ///
    /// Returns an error if navigation cannot be initiated.
    fn redirect(&self, url: &Url) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_options_default_to_fixed_size() {
        let options = PopupOptions::default();
        assert_eq!(options.width, 480);
        assert_eq!(options.height, 640);
    }
}
