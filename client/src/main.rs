//! Command line driver for the session client.
//!
//! Restores the stored session and reports who is signed in. When nobody is
//! and `LOGIN_EMAIL`/`LOGIN_PASSWORD` are set, signs in with them.

use anyhow::Context;
use session_client::session::LoginRequest;
use session_client::utils::MemoryNavigator;
use session_client::{Config, SessionClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::from_env()?;
    let home = config.home_route.clone();
    let client = SessionClient::from_config(config, Arc::new(MemoryNavigator::new(home)))?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    if let Some(principal) = client.auth().get_authentication_state(&cancel).await? {
        info!(
            "Signed in as {} <{}> (admin: {})",
            principal.user_name(),
            principal.email(),
            principal.is_admin
        );
        return Ok(());
    }

    let (Ok(email), Ok(password)) = (
        std::env::var("LOGIN_EMAIL"),
        std::env::var("LOGIN_PASSWORD"),
    ) else {
        info!("No session; set LOGIN_EMAIL and LOGIN_PASSWORD to sign in");
        return Ok(());
    };

    let result = client
        .auth()
        .sign_in(&LoginRequest::new(email, password), &cancel)
        .await
        .context("Sign-in failed")?;

    match &result.data {
        Some(principal) => info!("Signed in as {}", principal.user_name()),
        None => {
            warn!(
                "Sign-in rejected ({}): {}",
                result.status,
                result.message.as_deref().unwrap_or_default()
            );
            for field_error in result.field_errors() {
                warn!("  {}", field_error);
            }
        }
    }

    Ok(())
}
