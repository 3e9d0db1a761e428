//! Authenticated request pipeline.
//!
//! Each call reads the stored session, attaches its bearer token, sends the
//! request and interprets the response. A 401 on a request that carried a
//! token goes through the [`RefreshCoordinator`]; if it yields a newer token
//! the original request is sent once more. Callers only ever see the final
//! [`ApiResult`].

use crate::api::common::{ApiResult, BodyDecoder, ValidationProblem};
use crate::api::refresh::RefreshCoordinator;
use crate::api::transport::{ArcTransport, HttpRequest, HttpResponse};
use crate::auth::events::AuthNotifier;
use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use crate::session::store::ArcSessionStore;
use crate::utils::navigation::ArcNavigator;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub struct ApiClient {
    config: Arc<Config>,
    transport: ArcTransport,
    store: ArcSessionStore,
    coordinator: RefreshCoordinator,
}

impl ApiClient {
    pub fn new(
        config: Arc<Config>,
        transport: ArcTransport,
        store: ArcSessionStore,
        navigator: ArcNavigator,
        notifier: Arc<AuthNotifier>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(
            config.clone(),
            transport.clone(),
            store.clone(),
            navigator,
            notifier,
        );
        Self {
            config,
            transport,
            store,
            coordinator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArcSessionStore {
        &self.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub async fn get<D: BodyDecoder>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<D::Output>> {
        self.send::<D>(Method::GET, path, None, true, cancel).await
    }

    pub async fn post<B, D>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<D::Output>>
    where
        B: Serialize + ?Sized,
        D: BodyDecoder,
    {
        let body = to_json(body)?;
        self.send::<D>(Method::POST, path, Some(body), true, cancel)
            .await
    }

    pub async fn put<B, D>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<D::Output>>
    where
        B: Serialize + ?Sized,
        D: BodyDecoder,
    {
        let body = to_json(body)?;
        self.send::<D>(Method::PUT, path, Some(body), true, cancel)
            .await
    }

    /// POST without credentials and without refresh handling, for endpoints
    /// that establish a session rather than use one.
    pub async fn post_anonymous<B, D>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<D::Output>>
    where
        B: Serialize + ?Sized,
        D: BodyDecoder,
    {
        let body = to_json(body)?;
        self.send::<D>(Method::POST, path, Some(body), false, cancel)
            .await
    }

    pub async fn delete<D: BodyDecoder>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<D::Output>> {
        self.send::<D>(Method::DELETE, path, None, true, cancel).await
    }

    async fn send<D: BodyDecoder>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        authenticate: bool,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<D::Output>> {
        let url = self.config.resolve_url(path);
        let mut retried = false;

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let bearer = if authenticate {
                self.store.get().await?.map(|s| s.access_token)
            } else {
                None
            };
            let request = HttpRequest {
                method: method.clone(),
                url: url.clone(),
                bearer: bearer.clone(),
                body: body.clone(),
            };

            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                sent = self.transport.send(request) => sent,
            };
            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    warn!("{} {} failed: {}", method, url, e);
                    return Ok(ApiResult::transport_fault(e.to_string()));
                }
            };

            // Only a request that carried a token can be recovered, and only once.
            if response.status == StatusCode::UNAUTHORIZED && !retried {
                if let Some(token) = bearer.as_deref() {
                    if self.coordinator.refresh(token, cancel).await?.is_refreshed() {
                        debug!("Retrying {} {} with refreshed token", method, url);
                        retried = true;
                        continue;
                    }
                    return Ok(ApiResult::failure(response.status, response.reason));
                }
            }

            return interpret::<D>(&method, &url, response);
        }
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> ClientResult<String> {
    serde_json::to_string(body).map_err(|e| ClientError::invalid_request(e.to_string()))
}

fn interpret<D: BodyDecoder>(
    method: &Method,
    url: &str,
    response: HttpResponse,
) -> ClientResult<ApiResult<D::Output>> {
    let HttpResponse {
        status,
        reason,
        body,
    } = response;

    if status.is_success() {
        let data = D::decode(body).inspect_err(|e| {
            error!("{} {} returned an unexpected body: {}", method, url, e);
        })?;
        return Ok(ApiResult::success(status, data));
    }

    let result = ApiResult::failure(status, reason);
    Ok(match ValidationProblem::parse(&body) {
        Some(problem) => result.with_errors(problem),
        None => result,
    })
}
