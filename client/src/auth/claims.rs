//! Claims carried inside the session record and the principal derived from them.
//!
//! The claims travel as base64 (standard alphabet) wrapping a camelCase JSON
//! object, exactly as `GET users/claims` returns them.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity attributes of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: String,
    pub user_name: String,
    pub email: String,
    #[serde(alias = "roles", default)]
    pub role: String,
}

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Claims are not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Claims are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes claims into the opaque blob stored in the session.
pub fn encode_claims(claims: &Claims) -> Result<String, ClaimsError> {
    let json = serde_json::to_vec(claims)?;
    Ok(general_purpose::STANDARD.encode(json))
}

/// Decodes the opaque claims blob.
///
/// Surrounding whitespace and JSON string quotes are tolerated, since some
/// servers send the blob as a JSON string literal.
pub fn decode_claims(blob: &str) -> Result<Claims, ClaimsError> {
    let trimmed = blob.trim().trim_matches('"');
    let bytes = general_purpose::STANDARD.decode(trimmed)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub claims: Claims,
    pub is_admin: bool,
}

impl Principal {
    pub fn from_claims(claims: Claims, admin_role: &str) -> Self {
        let is_admin = claims.role == admin_role;
        Principal { claims, is_admin }
    }

    pub fn user_id(&self) -> &str {
        &self.claims.id
    }

    pub fn user_name(&self) -> &str {
        &self.claims.user_name
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    pub fn role(&self) -> &str {
        &self.claims.role
    }

    /// Check if user has specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Claims {
        Claims {
            id: "9f1c".to_string(),
            user_name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: "Admin".to_string(),
        }
    }

    #[test]
    fn test_encode_decode_claims() {
        let blob = encode_claims(&alice()).unwrap();
        assert_eq!(decode_claims(&blob).unwrap(), alice());
    }

    #[test]
    fn test_decode_server_payload() {
        let json = r#"{"id":"1","userName":"bob","email":"bob@example.com","roles":"User"}"#;
        let blob = general_purpose::STANDARD.encode(json);

        let claims = decode_claims(&format!("\"{blob}\"\n")).unwrap();
        assert_eq!(claims.user_name, "bob");
        assert_eq!(claims.role, "User");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_claims("%%%"), Err(ClaimsError::Base64(_))));

        let not_json = general_purpose::STANDARD.encode("hello");
        assert!(matches!(decode_claims(&not_json), Err(ClaimsError::Json(_))));
    }

    #[test]
    fn test_principal_admin_flag() {
        let admin = Principal::from_claims(alice(), "Admin");
        assert!(admin.is_admin);
        assert!(admin.has_role("Admin"));

        let mut claims = alice();
        claims.role = "User".to_string();
        let user = Principal::from_claims(claims, "Admin");
        assert!(!user.is_admin);
        assert_eq!(user.user_name(), "alice");
    }
}
