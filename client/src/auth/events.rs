//! Authentication state change notifications.
//!
//! One [`AuthNotifier`] is shared by the refresh coordinator and the auth
//! state provider. It keeps the last published principal and fans changes out
//! to subscribers over a broadcast channel.

use crate::auth::claims::Principal;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

/// Broadcast channel capacity for auth state change events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    /// A principal was derived from the stored session.
    Authenticated(Principal),
    /// The access token was rotated; the principal is unchanged.
    TokenRefreshed,
    /// The server rejected the refresh token and the session was dropped.
    SessionExpired,
    /// The user signed out.
    SignedOut,
}

#[derive(Debug)]
pub struct AuthNotifier {
    tx: broadcast::Sender<AuthStateChange>,
    current: RwLock<Option<Principal>>,
}

impl AuthNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tx,
            current: RwLock::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.tx.subscribe()
    }

    /// Last published principal, `None` when anonymous.
    pub async fn current(&self) -> Option<Principal> {
        self.current.read().await.clone()
    }

    /// Drops the cached principal without notifying anyone.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    pub async fn publish(&self, change: AuthStateChange) {
        match &change {
            AuthStateChange::Authenticated(principal) => {
                *self.current.write().await = Some(principal.clone());
            }
            AuthStateChange::SessionExpired | AuthStateChange::SignedOut => {
                *self.current.write().await = None;
            }
            AuthStateChange::TokenRefreshed => {}
        }

        // No receivers is fine; the cached principal is still updated.
        if self.tx.send(change).is_err() {
            debug!("Auth state change published with no subscribers");
        }
    }
}

impl Default for AuthNotifier {
    fn default() -> Self {
        Self::new()
    }
}
