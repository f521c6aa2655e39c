//! JWT Token Handler
//! Mission: Issue and validate signed access/refresh tokens

use crate::auth::models::{Claims, TokenKind};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// Token verification failures
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Past its expiry timestamp
    Expired,
    /// Bad signature or structure
    Malformed,
    /// Valid token presented where the other kind was expected
    WrongKind,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Malformed => write!(f, "Token is malformed or has an invalid signature"),
            TokenError::WrongKind => write!(f, "Token kind does not match the expected kind"),
        }
    }
}

impl std::error::Error for TokenError {}

/// JWT handler for token operations. Holds the single process-wide
/// signing secret and the configured lifetimes for both token kinds.
pub struct JwtHandler {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtHandler {
    pub fn new(secret: String, access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Issue an access token with the configured lifetime
    pub fn issue_access(&self, username: &str) -> Result<String> {
        self.issue(username, TokenKind::Access, self.access_ttl)
    }

    /// Issue a refresh token with the configured lifetime
    pub fn issue_refresh(&self, username: &str) -> Result<String> {
        self.issue(username, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Issue a token of the given kind with an explicit lifetime.
    /// Every token gets a fresh jti for revocation tracking.
    pub fn issue(&self, username: &str, kind: TokenKind, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: expiration,
            kind,
        };

        debug!(
            "Issuing {} token for {} (jti {})",
            kind.as_str(),
            username,
            claims.jti
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Validate a token and extract its claims. The kind discriminator
    /// must match: an access token is never accepted where a refresh
    /// token is expected and vice versa.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;

        let claims = decoded.claims;
        if claims.kind != expected {
            return Err(TokenError::WrongKind);
        }

        debug!("Validated {} token for {}", expected.as_str(), claims.sub);

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_handler() -> JwtHandler {
        JwtHandler::new("test-secret-key-12345".to_string(), 15, 30)
    }

    #[test]
    fn test_access_token_round_trip() {
        let handler = test_handler();

        let token = handler.issue_access("alice").unwrap();
        assert!(!token.is_empty());

        let claims = handler.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(!claims.jti.is_empty());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let handler = test_handler();

        let token = handler.issue_refresh("alice").unwrap();
        let claims = handler.verify(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let handler = test_handler();

        let access = handler.issue_access("alice").unwrap();
        let refresh = handler.issue_refresh("alice").unwrap();

        assert_eq!(
            handler.verify(&access, TokenKind::Refresh).unwrap_err(),
            TokenError::WrongKind
        );
        assert_eq!(
            handler.verify(&refresh, TokenKind::Access).unwrap_err(),
            TokenError::WrongKind
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let handler = test_handler();

        let token = handler
            .issue("alice", TokenKind::Access, Duration::seconds(-120))
            .unwrap();

        assert_eq!(
            handler.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new("secret1".to_string(), 15, 30);
        let handler2 = JwtHandler::new("secret2".to_string(), 15, 30);

        let token = handler1.issue_access("alice").unwrap();
        assert_eq!(
            handler2.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_tampered_token_rejected() {
        let handler = test_handler();

        let mut token = handler.issue_access("alice").unwrap();
        token.push('x');

        assert_eq!(
            handler.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(
            handler.verify("invalid.token.here", TokenKind::Access).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_each_token_gets_fresh_jti() {
        let handler = test_handler();

        let first = handler.issue_access("alice").unwrap();
        let second = handler.issue_access("alice").unwrap();

        let first_claims = handler.verify(&first, TokenKind::Access).unwrap();
        let second_claims = handler.verify(&second, TokenKind::Access).unwrap();
        assert_ne!(first_claims.jti, second_claims.jti);
    }
}
