//! Single-flight access token refresh.
//!
//! State machine: `Idle -> Refreshing -> {Idle, Failed}`. Callers that see a
//! 401 queue on one async gate; whoever gets it first performs the exchange,
//! the rest find the token already rotated (or the state already `Failed`)
//! and share that outcome without a network call. `Failed` is terminal until
//! [`RefreshCoordinator::reset`] is called by a fresh login.

use crate::api::endpoints;
use crate::api::transport::{ArcTransport, HttpRequest};
use crate::auth::events::{AuthNotifier, AuthStateChange};
use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use crate::session::models::{RefreshTokenRequest, Session, TokenResponse};
use crate::session::store::ArcSessionStore;
use crate::utils::navigation::ArcNavigator;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
    /// The server rejected the refresh token; no further attempts until login.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The stored session now holds a token newer than the rejected one.
    Refreshed,
    Failed,
}

impl RefreshOutcome {
    pub fn is_refreshed(self) -> bool {
        self == RefreshOutcome::Refreshed
    }
}

/// Token the last finished exchange tried to replace, and how it ended.
struct Attempt {
    token: String,
    outcome: RefreshOutcome,
}

enum Exchange {
    Rotated,
    Rejected(StatusCode),
    Unreachable(String),
}

pub struct RefreshCoordinator {
    config: Arc<Config>,
    transport: ArcTransport,
    store: ArcSessionStore,
    navigator: ArcNavigator,
    notifier: Arc<AuthNotifier>,
    state: watch::Sender<RefreshState>,
    gate: Mutex<Option<Attempt>>,
    /// Number of finished exchanges.
    generation: AtomicU64,
}

/// Puts a `Refreshing` state back to `Idle` if the exchange future is dropped.
struct RefreshingGuard<'a>(&'a watch::Sender<RefreshState>);

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| {
            if *state == RefreshState::Refreshing {
                *state = RefreshState::Idle;
                true
            } else {
                false
            }
        });
    }
}

impl RefreshCoordinator {
    pub fn new(
        config: Arc<Config>,
        transport: ArcTransport,
        store: ArcSessionStore,
        navigator: ArcNavigator,
        notifier: Arc<AuthNotifier>,
    ) -> Self {
        let (state, _) = watch::channel(RefreshState::Idle);
        Self {
            config,
            transport,
            store,
            navigator,
            notifier,
            state,
            gate: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<RefreshState> {
        self.state.subscribe()
    }

    /// Back to `Idle`; called when a new session is created.
    pub fn reset(&self) {
        self.state.send_replace(RefreshState::Idle);
    }

    /// Obtains a token newer than `rejected_token`, refreshing at most once
    /// across all concurrent callers.
    ///
    /// Cancellation only applies while waiting for the gate. Once this caller
    /// owns the exchange it runs to completion, since its outcome is shared.
    pub async fn refresh(
        &self,
        rejected_token: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<RefreshOutcome> {
        let seen = self.generation.load(Ordering::Acquire);
        let mut last = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            gate = self.gate.lock() => gate,
        };
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        if self.state() == RefreshState::Failed {
            debug!("Refresh skipped: an earlier refresh was rejected");
            return Ok(RefreshOutcome::Failed);
        }

        let Some(session) = self.store.get().await?.filter(Session::has_tokens) else {
            warn!("Refresh requested but no usable session is stored");
            self.state.send_replace(RefreshState::Failed);
            return Ok(RefreshOutcome::Failed);
        };

        if session.access_token != rejected_token {
            debug!("Access token already rotated by a concurrent refresh");
            return Ok(RefreshOutcome::Refreshed);
        }

        // An exchange for this token finished while we queued; its outcome is ours.
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(attempt) = last.as_ref().filter(|a| a.token == rejected_token) {
                debug!("Sharing the outcome of the refresh that just finished");
                return Ok(attempt.outcome);
            }
        }

        self.state.send_replace(RefreshState::Refreshing);
        let guard = RefreshingGuard(&self.state);
        info!("Access token rejected, refreshing session");

        let exchange = self.exchange(&session).await;
        let outcome = match exchange {
            Ok(Exchange::Rotated) => {
                self.state.send_replace(RefreshState::Idle);
                info!("Session refreshed");
                self.notifier.publish(AuthStateChange::TokenRefreshed).await;
                RefreshOutcome::Refreshed
            }
            Ok(Exchange::Rejected(status)) => {
                self.state.send_replace(RefreshState::Failed);
                warn!("Refresh rejected with status {}, signing out", status);
                self.force_sign_out().await?;
                RefreshOutcome::Failed
            }
            Ok(Exchange::Unreachable(message)) => {
                self.state.send_replace(RefreshState::Idle);
                warn!("Refresh endpoint unreachable: {}", message);
                RefreshOutcome::Failed
            }
            Err(e) => {
                self.state.send_replace(RefreshState::Idle);
                error!("Refresh aborted: {}", e);
                return Err(e);
            }
        };
        drop(guard);

        *last = Some(Attempt {
            token: rejected_token.to_string(),
            outcome,
        });
        self.generation.fetch_add(1, Ordering::AcqRel);

        Ok(outcome)
    }

    async fn exchange(&self, session: &Session) -> ClientResult<Exchange> {
        let body = serde_json::to_string(&RefreshTokenRequest {
            refresh_token: &session.refresh_token,
        })
        .map_err(|e| ClientError::invalid_request(e.to_string()))?;

        let request = HttpRequest::new(
            Method::POST,
            self.config.resolve_url(endpoints::REFRESH_TOKEN),
        )
        .bearer(session.access_token.as_str())
        .json_body(body);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => return Ok(Exchange::Unreachable(e.to_string())),
        };

        if !response.status.is_success() {
            return Ok(Exchange::Rejected(response.status));
        }

        match serde_json::from_str::<TokenResponse>(&response.body) {
            Ok(tokens) if !tokens.access_token.is_empty() && !tokens.refresh_token.is_empty() => {
                let rotated = session.rotate(tokens);
                self.store.set(&rotated).await?;
                Ok(Exchange::Rotated)
            }
            Ok(_) => {
                warn!("Refresh response is missing tokens");
                Ok(Exchange::Rejected(response.status))
            }
            Err(e) => {
                warn!("Refresh response could not be parsed: {}", e);
                Ok(Exchange::Rejected(response.status))
            }
        }
    }

    async fn force_sign_out(&self) -> ClientResult<()> {
        let cleared = self.store.clear().await;
        self.notifier.publish(AuthStateChange::SessionExpired).await;
        self.navigator.navigate_to(&self.config.login_route, true);
        cleared
    }
}
