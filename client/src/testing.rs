//! Test doubles shared by the unit tests.

use crate::api::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::errors::TransportError;
use crate::session::models::Session;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type Responder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// Transport answering from a closure and recording every request.
///
/// Yields once per request so concurrent callers interleave the way they
/// would over a real network.
pub struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<HttpRequest>>,
    held: Option<(&'static str, Arc<Notify>)>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            held: None,
        }
    }

    /// Requests to `path` wait for a `release` notification before answering.
    pub fn hold(mut self, path: &'static str, release: Arc<Notify>) -> Self {
        self.held = Some((path, release));
        self
    }

    pub fn unreachable(message: &'static str) -> Self {
        Self::new(move |_| Err(TransportError(message.to_string())))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests whose URL ends with `path`.
    pub fn count_path(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.ends_with(path))
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        if let Some((path, release)) = &self.held {
            if request.url.ends_with(path) {
                release.notified().await;
            }
        }
        (self.responder)(&request)
    }
}

pub fn session(access: &str, refresh: &str) -> Session {
    Session {
        token_type: "Bearer".to_string(),
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_in: 3600,
        claims: None,
    }
}

pub fn token_json(access: &str, refresh: &str) -> String {
    serde_json::json!({
        "tokenType": "Bearer",
        "accessToken": access,
        "expiresIn": 3600,
        "refreshToken": refresh,
    })
    .to_string()
}
