//! Widget login flow with PKCE
//!
//! This example demonstrates the full client-side protocol without a
//! browser: a stub user agent stands in for the window layer, and the
//! consent window's result message is injected by hand.
//!
//! Flow:
//! 1. The widget builds an authorization request (fresh state + PKCE)
//! 2. The "popup" opens and the URL is printed
//! 3. A simulated consent window posts oauth_success to the opener
//! 4. The session validates origin and state and extracts the code

use std::sync::Arc;

use kimlik_connect::bridge::WindowMessage;
use kimlik_connect::error::AuthResult;
use kimlik_connect::session::{AuthOutcome, AuthSession, SessionOptions};
use kimlik_connect::transport::{PopupOptions, UserAgent, WindowHandle};
use kimlik_connect::ClientConfig;

/// Stand-in for the browser window layer: prints what it is asked to do.
struct PrintingUserAgent;

struct OpenWindow;

impl WindowHandle for OpenWindow {
    fn is_closed(&self) -> bool {
        false
    }
    fn close(&self) {
        println!("   (popup closed)");
    }
}

impl UserAgent for PrintingUserAgent {
    fn open_popup(
        &self,
        url: &url::Url,
        options: &PopupOptions,
    ) -> AuthResult<Box<dyn WindowHandle>> {
        println!(
            "1. Opening {}x{} popup:\n   {}\n",
            options.width, options.height, url
        );
        Ok(Box::new(OpenWindow))
    }

    fn redirect(&self, url: &url::Url) -> AuthResult<()> {
        println!("1. Redirecting page to:\n   {}\n", url);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Kimlik Connect: popup login flow ===\n");

    let config = ClientConfig::new(
        "my-client-id",
        "https://id.kimlik.az",
        "https://partner.example/callback",
    )?
    .with_scopes(vec!["profile".to_string(), "wallet".to_string()]);

    let user_agent = Arc::new(PrintingUserAgent);
    let (messages_tx, messages_rx) = tokio::sync::mpsc::unbounded_channel();

    let mut session = AuthSession::open(
        &config,
        user_agent.as_ref(),
        SessionOptions::default(),
        messages_rx,
    )?;

    // Simulate the consent window. On "Allow" it would post
    // oauth_success with a redirect URI carrying code + state; here the
    // user clicks "Deny" instead, which needs no state echo.
    let flow = session.flow_id();
    println!("2. Waiting for the consent window (flow {flow})...\n");

    messages_tx.send(WindowMessage::new(
        config.expected_origin(),
        serde_json::json!({
            "type": "oauth_denied",
        }),
    ))?;

    match session.run().await? {
        AuthOutcome::Authorized { code } => {
            println!("3. Authorized! Exchange the code for tokens:");
            println!("   token_client.exchange_code({code:?}, verifier).await?");
        }
        AuthOutcome::Denied => {
            println!("3. The user denied the request - no token exchange happens.");
        }
        other => println!("3. Flow ended: {other:?}"),
    }

    Ok(())
}
