//! Authentication Middleware
//! Mission: Protect API endpoints with access-token validation

use crate::auth::{api::AuthState, models::Claims, models::TokenKind};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

/// Auth middleware that validates bearer access tokens. A token must
/// carry a valid signature, be unexpired, be of the access kind, and
/// its jti must not appear on the revocation ledger.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let claims = state
        .jwt_handler
        .verify(&token, TokenKind::Access)
        .map_err(|_| AuthError::InvalidToken)?;

    let revoked = state
        .revocation
        .is_revoked(&claims.jti)
        .map_err(|_| AuthError::InvalidToken)?;
    if revoked {
        debug!("Rejected revoked token jti {} for {}", claims.jti, claims.sub);
        return Err(AuthError::RevokedToken);
    }

    // Add claims to request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Pull the token out of an `Authorization: Bearer ...` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Middleware rejection reasons, all surfaced as 401
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    RevokedToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidToken => "Invalid or expired token",
            AuthError::RevokedToken => "Token has been revoked",
        };

        (StatusCode::UNAUTHORIZED, Json(json!({ "msg": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest};

    #[test]
    fn test_auth_error_responses() {
        let missing = AuthError::MissingToken.into_response();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let invalid = AuthError::InvalidToken.into_response();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

        let revoked = AuthError::RevokedToken.into_response();
        assert_eq!(revoked.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert("Authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert("Authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_extract_claims_from_request() {
        let mut req = HttpRequest::new(Body::empty());

        // No claims initially
        assert!(extract_claims(&req).is_none());

        let claims = Claims {
            sub: "alice".to_string(),
            jti: "jti-1".to_string(),
            iat: 1700000000,
            exp: 1700000900,
            kind: TokenKind::Access,
        };
        req.extensions_mut().insert(claims.clone());

        let extracted = extract_claims(&req);
        assert!(extracted.is_some());
        assert_eq!(extracted.unwrap().sub, "alice");
    }
}
