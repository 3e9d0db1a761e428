//! Wiring for a ready-to-use client.

use crate::api::pipeline::ApiClient;
use crate::api::transport::{ArcTransport, ReqwestTransport};
use crate::auth::events::AuthNotifier;
use crate::auth::provider::AuthStateProvider;
use crate::config::Config;
use crate::errors::ClientResult;
use crate::session::store::{ArcSessionStore, FileSessionStore, MemorySessionStore};
use crate::utils::navigation::ArcNavigator;
use anyhow::anyhow;
use std::sync::Arc;
use tracing::info;

/// Pipeline and auth state provider sharing one store, navigator and notifier.
pub struct SessionClient {
    api: Arc<ApiClient>,
    provider: AuthStateProvider,
}

impl SessionClient {
    /// Builds a client over HTTP. Sessions persist to disk when
    /// `session_store_dir` is configured and live in memory otherwise.
    pub fn from_config(config: Config, navigator: ArcNavigator) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())
            .map_err(|e| anyhow!("{}", e))?;

        let store: ArcSessionStore = match &config.session_store_dir {
            Some(dir) => {
                let store = FileSessionStore::new(dir, &config.session_storage_key);
                info!("Persisting session to {}", store.path().display());
                Arc::new(store)
            }
            None => Arc::new(MemorySessionStore::new(config.session_storage_key.as_str())),
        };

        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            store,
            navigator,
        ))
    }

    pub fn with_parts(
        config: Config,
        transport: ArcTransport,
        store: ArcSessionStore,
        navigator: ArcNavigator,
    ) -> Self {
        let notifier = Arc::new(AuthNotifier::new());
        let api = Arc::new(ApiClient::new(
            Arc::new(config),
            transport,
            store,
            navigator.clone(),
            notifier.clone(),
        ));
        let provider = AuthStateProvider::new(api.clone(), navigator, notifier);

        Self { api, provider }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthStateProvider {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::NoContent;
    use crate::api::transport::HttpResponse;
    use crate::session::store::SessionStore;
    use crate::testing::{ScriptedTransport, session};
    use crate::utils::navigation::MemoryNavigator;
    use reqwest::StatusCode;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_parts_share_one_store() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(HttpResponse::new(StatusCode::NO_CONTENT, ""))
        }));
        let store = Arc::new(MemorySessionStore::new("session"));
        let client = SessionClient::with_parts(
            Config::new("http://api.test/api"),
            transport.clone(),
            store.clone(),
            Arc::new(MemoryNavigator::new("/home")),
        );

        store.set(&session("A1", "R1")).await.unwrap();
        let result = client
            .api()
            .get::<NoContent>("users", &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(transport.requests()[0].bearer.as_deref(), Some("A1"));
        assert_eq!(transport.requests()[0].url, "http://api.test/api/users");

        client.auth().logout(&CancellationToken::new()).await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new("http://api.test/api/");
        config.session_store_dir = Some(dir.path().to_path_buf());

        let client =
            SessionClient::from_config(config, Arc::new(MemoryNavigator::default())).unwrap();
        client.api().store().set(&session("A1", "R1")).await.unwrap();
        assert!(dir.path().join("session.json").exists());
    }
}
