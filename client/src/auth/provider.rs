//! Derived authentication state.
//!
//! The provider never stores a principal of its own: each call to
//! [`AuthStateProvider::get_authentication_state`] rebuilds it from the
//! session store. Login and logout create and delete whole sessions, then
//! re-derive and publish the state.

use crate::api::common::{ApiResult, JsonBody, NoContent, RawText};
use crate::api::endpoints;
use crate::api::pipeline::ApiClient;
use crate::auth::claims::{Principal, decode_claims};
use crate::auth::events::{AuthNotifier, AuthStateChange};
use crate::errors::{ClientError, ClientResult};
use crate::session::models::{LoginRequest, Session, TokenResponse};
use crate::utils::navigation::ArcNavigator;
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

pub struct AuthStateProvider {
    api: Arc<ApiClient>,
    navigator: ArcNavigator,
    notifier: Arc<AuthNotifier>,
}

impl AuthStateProvider {
    pub fn new(api: Arc<ApiClient>, navigator: ArcNavigator, notifier: Arc<AuthNotifier>) -> Self {
        Self {
            api,
            navigator,
            notifier,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.notifier.subscribe()
    }

    /// Last published principal, without touching the store or the network.
    pub async fn current_principal(&self) -> Option<Principal> {
        self.notifier.current().await
    }

    /// Resolves who is signed in. `None` means anonymous.
    pub async fn get_authentication_state(
        &self,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<Principal>> {
        let config = self.api.config();

        let Some(session) = self.api.store().get().await? else {
            return self.anonymous().await;
        };

        let route = self.navigator.current_route();
        if config.is_anonymous_only_route(&route) {
            debug!("On {}, skipping session check", route);
            return self.anonymous().await;
        }

        let Some(principal) = self.principal_from(&session) else {
            return self.anonymous().await;
        };

        if config.verify_session_with_server {
            // May refresh the token on the way; only a final 401 demotes the user.
            let check = self
                .api
                .get::<NoContent>(endpoints::GET_CLAIMS, cancel)
                .await?;
            if check.is_unauthorized() {
                info!("Server no longer accepts the stored session");
                return self.anonymous().await;
            }
            if !check.is_success() {
                warn!(
                    "Session check returned {}, keeping local claims",
                    check.status
                );
            }
        }

        if self.notifier.current().await.as_ref() != Some(&principal) {
            self.notifier
                .publish(AuthStateChange::Authenticated(principal.clone()))
                .await;
        }
        Ok(Some(principal))
    }

    /// Stores a freshly issued session, attaches the server's claims to it
    /// and publishes the resulting principal.
    ///
    /// A session whose claims cannot be loaded is not kept.
    pub async fn login(
        &self,
        session: Session,
        cancel: &CancellationToken,
    ) -> ClientResult<Option<Principal>> {
        if !session.has_tokens() {
            return Err(ClientError::validation(
                "Session must carry an access token and a refresh token",
            ));
        }

        let store = self.api.store();
        self.api.coordinator().reset();
        store.set(&session).await?;

        let claims = self
            .api
            .get::<RawText>(endpoints::GET_CLAIMS, cancel)
            .await?;

        // The claims call may have rotated the tokens, so merge into what is stored now.
        let Some(mut current) = store.get().await? else {
            warn!("Session was dropped while fetching claims");
            return self.anonymous().await;
        };
        if claims.is_success() {
            current.claims = claims.data;
        } else {
            warn!("Failed to fetch user claims: {}", claims.status);
        }
        store.set(&current).await?;

        let Some(principal) = self.principal_from(&current) else {
            warn!("No claims for the new session, discarding it");
            store.clear().await?;
            return self.anonymous().await;
        };

        info!("Signed in as {}", principal.user_name());
        self.notifier
            .publish(AuthStateChange::Authenticated(principal.clone()))
            .await;
        self.navigator
            .navigate_to(&self.api.config().home_route, false);

        Ok(Some(principal))
    }

    /// Exchanges credentials for a session and logs in with it.
    ///
    /// Rejected credentials come back as the failed [`ApiResult`].
    pub async fn sign_in(
        &self,
        request: &LoginRequest,
        cancel: &CancellationToken,
    ) -> ClientResult<ApiResult<Principal>> {
        if let Err(validation_errors) = request.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(ClientError::validation(error_messages.join(", ")));
        }

        let response = self
            .api
            .post_anonymous::<_, JsonBody<TokenResponse>>(endpoints::LOGIN, request, cancel)
            .await?;

        if !response.is_success() {
            warn!("Sign-in rejected with status {}", response.status);
            return Ok(response.without_data());
        }
        let status = response.status;
        let Some(tokens) = response.data else {
            return Err(ClientError::decode("Login response carried no tokens"));
        };

        match self.login(Session::from_tokens(tokens), cancel).await? {
            Some(principal) => Ok(ApiResult::success(status, Some(principal))),
            None => Ok(ApiResult::failure(
                StatusCode::UNAUTHORIZED,
                Some("User claims could not be loaded".to_string()),
            )),
        }
    }

    /// Signs out locally, telling the server on a best-effort basis.
    pub async fn logout(&self, cancel: &CancellationToken) -> ClientResult<()> {
        self.notifier.clear().await;

        match self.api.get::<NoContent>(endpoints::LOGOUT, cancel).await {
            Ok(result) if result.is_success() => debug!("Server session closed"),
            Ok(result) => warn!("Server logout returned {}", result.status),
            Err(e) => warn!("Server logout failed: {}", e),
        }

        self.api.store().clear().await?;
        info!("Signed out");
        self.notifier.publish(AuthStateChange::SignedOut).await;
        Ok(())
    }

    fn principal_from(&self, session: &Session) -> Option<Principal> {
        let blob = session.claims.as_deref()?;
        match decode_claims(blob) {
            Ok(claims) => Some(Principal::from_claims(
                claims,
                &self.api.config().admin_role,
            )),
            Err(e) => {
                warn!("Stored claims could not be decoded: {}", e);
                None
            }
        }
    }

    async fn anonymous(&self) -> ClientResult<Option<Principal>> {
        self.notifier.clear().await;
        Ok(None)
    }
}
