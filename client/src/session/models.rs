//! Wire and storage shapes for sessions and the identity endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// The persisted token bundle for one signed-in client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds, as issued.
    pub expires_in: i64,
    /// Base64-wrapped claims JSON, fetched after login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<String>,
}

impl Session {
    /// Builds a session from a token response, without claims.
    pub fn from_tokens(tokens: TokenResponse) -> Self {
        Session {
            token_type: tokens.token_type,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            claims: None,
        }
    }

    /// Replaces the token fields with a refreshed set, keeping the claims blob.
    pub fn rotate(&self, tokens: TokenResponse) -> Self {
        Session {
            claims: self.claims.clone(),
            ..Session::from_tokens(tokens)
        }
    }

    pub fn has_tokens(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

/// Response of `identity/login` and `identity/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token refresh request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Login request payload
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email address is required."))]
    pub email: String,

    #[validate(length(min = 8, max = 20, message = "Password should be between 8 and 20 chars."))]
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }
}
