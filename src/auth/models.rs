//! Authentication Models
//! Mission: Define user and token data structures shared across the auth stack

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Username length bounds enforced at registration
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 36;

/// Minimum password length enforced at registration
pub const PASSWORD_MIN_LEN: usize = 8;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub created_at: String,
}

/// Token kind discriminator embedded in every JWT
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenKind {
    #[serde(rename = "access")]
    Access, // Short-lived, authorizes protected requests
    #[serde(rename = "refresh")]
    Refresh, // Long-lived, only mints new access tokens
}

impl TokenKind {
    pub fn as_str(&self) -> &str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (username)
    pub jti: String, // unique token id, revocation key
    pub iat: usize,  // issued-at timestamp
    pub exp: usize,  // expiration timestamp
    pub kind: TokenKind,
}

/// Register/login request body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub msg: String,
    pub username: String,
    pub created_at: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Plain-message response (logout, errors)
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_serialization() {
        let access = TokenKind::Access;
        let json = serde_json::to_string(&access).unwrap();
        assert_eq!(json, r#""access""#);

        let refresh: TokenKind = serde_json::from_str(r#""refresh""#).unwrap();
        assert_eq!(refresh, TokenKind::Refresh);
    }

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$12$secret"));
        assert!(json.contains("alice"));
    }

    #[test]
    fn test_user_response_from_user() {
        let user = User {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
            password_hash: "hash".to_string(),
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
        };

        let response = UserResponse::from_user(&user);
        assert_eq!(response.username, "bob");
        assert_eq!(response.created_at, user.created_at);
    }
}
