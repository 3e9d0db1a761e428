//! Client configuration.
//!
//! Settings come from environment variables (optionally a `.env` file) or are
//! built in code with [`Config::new`] and adjusted field by field.

use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every relative request path is joined to.
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
    /// Name of the storage slot holding the serialized session.
    pub session_storage_key: String,
    /// Directory for the file-backed session store. `None` keeps the session in memory.
    pub session_store_dir: Option<PathBuf>,
    /// Role name that grants the admin flag on a principal.
    pub admin_role: String,
    pub login_route: String,
    pub register_route: String,
    /// Where the navigator is sent after a successful login.
    pub home_route: String,
    /// Confirm a stored session against the server when deriving auth state.
    pub verify_session_with_server: bool,
}

impl Config {
    /// Builds a configuration with defaults for everything but the base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Config {
            api_base_url: normalize_base_url(api_base_url.into()),
            request_timeout_seconds: 30,
            session_storage_key: "session".to_string(),
            session_store_dir: None,
            admin_role: "Admin".to_string(),
            login_route: "/login".to_string(),
            register_route: "/register".to_string(),
            home_route: "/home".to_string(),
            verify_session_with_server: true,
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("API_BASE_URL").context("API_BASE_URL not set")?;
        if api_base_url.trim().is_empty() {
            bail!("API_BASE_URL must not be empty");
        }

        let request_timeout_seconds = env::var("REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECONDS must be a valid number")?;

        let session_storage_key =
            env::var("SESSION_STORAGE_KEY").unwrap_or_else(|_| "session".to_string());

        let session_store_dir = env::var("SESSION_STORE_DIR").ok().map(PathBuf::from);

        let admin_role = env::var("ADMIN_ROLE").unwrap_or_else(|_| "Admin".to_string());
        let login_route = env::var("LOGIN_ROUTE").unwrap_or_else(|_| "/login".to_string());
        let register_route =
            env::var("REGISTER_ROUTE").unwrap_or_else(|_| "/register".to_string());
        let home_route = env::var("HOME_ROUTE").unwrap_or_else(|_| "/home".to_string());

        let verify_session_with_server = env::var("VERIFY_SESSION_WITH_SERVER")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .context("VERIFY_SESSION_WITH_SERVER must be true or false")?;

        Ok(Config {
            api_base_url: normalize_base_url(api_base_url),
            request_timeout_seconds,
            session_storage_key,
            session_store_dir,
            admin_role,
            login_route,
            register_route,
            home_route,
            verify_session_with_server,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Resolves a request path against the base URL. Absolute URLs pass through.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            return path.to_string();
        }
        format!("{}{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// Routes that only make sense for anonymous users.
    pub fn is_anonymous_only_route(&self, route: &str) -> bool {
        let route = route.split(['?', '#']).next().unwrap_or(route);
        [&self.login_route, &self.register_route]
            .iter()
            .any(|r| r.trim_end_matches('/').eq_ignore_ascii_case(route.trim_end_matches('/')))
    }
}

fn normalize_base_url(url: String) -> String {
    if url.ends_with('/') {
        url
    } else {
        format!("{url}/")
    }
}
