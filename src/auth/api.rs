//! Authentication API Endpoints
//! Mission: Compose the hasher, store, token handler, and ledger into auth flows

use crate::auth::{
    jwt::JwtHandler,
    middleware::{bearer_token, extract_claims},
    models::{
        CredentialsRequest, LoginResponse, MessageResponse, RefreshResponse, RegisterResponse,
        TokenKind, UserResponse, PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN,
    },
    password::PasswordHasher,
    revocation::RevocationLedger,
    user_store::{StoreError, UserStore},
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state, constructed once in main and cloned into handlers
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub revocation: Arc<RevocationLedger>,
    pub jwt_handler: Arc<JwtHandler>,
    pub hasher: PasswordHasher,
}

impl AuthState {
    pub fn new(
        user_store: Arc<UserStore>,
        revocation: Arc<RevocationLedger>,
        jwt_handler: Arc<JwtHandler>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            user_store,
            revocation,
            jwt_handler,
            hasher,
        }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthApiError> {
    validate_credentials(&payload.username, &payload.password)?;

    let password_hash = state.hasher.hash(&payload.password).map_err(|e| {
        warn!("Password hashing failed: {}", e);
        AuthApiError::Internal
    })?;

    let user = state
        .user_store
        .create_user(&payload.username, &password_hash)
        .map_err(|e| match e {
            StoreError::Duplicate => AuthApiError::DuplicateUser,
            other => {
                warn!("Failed to create user: {}", other);
                AuthApiError::Internal
            }
        })?;

    info!("✅ Registered user: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            msg: "User created successfully".to_string(),
            username: user.username,
            created_at: user.created_at,
        }),
    ))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    // An unknown username and a wrong password collapse into the same
    // error so callers cannot enumerate accounts.
    let user = match state.user_store.get_user_by_username(&payload.username) {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!("❌ Failed login attempt: {}", payload.username);
            return Err(AuthApiError::InvalidCredentials);
        }
        Err(e) => {
            warn!("User lookup failed: {}", e);
            return Err(AuthApiError::Internal);
        }
    };

    let valid = state
        .hasher
        .verify(&payload.password, &user.password_hash)
        .map_err(|e| {
            warn!("Password verification failed: {}", e);
            AuthApiError::Internal
        })?;

    if !valid {
        warn!("❌ Failed login attempt: {}", payload.username);
        return Err(AuthApiError::InvalidCredentials);
    }

    let access_token = state
        .jwt_handler
        .issue_access(&user.username)
        .map_err(|_| AuthApiError::Internal)?;
    let refresh_token = state
        .jwt_handler
        .issue_refresh(&user.username)
        .map_err(|_| AuthApiError::Internal)?;

    info!("✅ Login successful: {}", user.username);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        user: UserResponse::from_user(&user),
    }))
}

/// Current identity - GET /api/auth/whoami (behind auth middleware)
pub async fn whoami(
    State(state): State<AuthState>,
    req: Request,
) -> Result<Json<UserResponse>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;

    let user = state
        .user_store
        .get_user_by_username(&claims.sub)
        .map_err(|e| match e {
            StoreError::NotFound => AuthApiError::Unauthorized,
            other => {
                warn!("User lookup failed: {}", other);
                AuthApiError::Internal
            }
        })?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Mint a new access token - GET /api/auth/refresh
///
/// Takes a refresh token, not an access token, so it sits outside the
/// auth middleware and does its own verification: refresh kind, not on
/// the denylist, and the subject must still exist.
pub async fn refresh(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResponse>, AuthApiError> {
    let token = bearer_token(&headers).ok_or(AuthApiError::Unauthorized)?;

    let claims = state
        .jwt_handler
        .verify(&token, TokenKind::Refresh)
        .map_err(|_| AuthApiError::Unauthorized)?;

    let revoked = state.revocation.is_revoked(&claims.jti).map_err(|e| {
        warn!("Revocation check failed: {}", e);
        AuthApiError::Internal
    })?;
    if revoked {
        return Err(AuthApiError::Unauthorized);
    }

    let user = state
        .user_store
        .get_user_by_username(&claims.sub)
        .map_err(|e| match e {
            StoreError::NotFound => AuthApiError::Unauthorized,
            other => {
                warn!("User lookup failed: {}", other);
                AuthApiError::Internal
            }
        })?;

    let access_token = state
        .jwt_handler
        .issue_access(&user.username)
        .map_err(|_| AuthApiError::Internal)?;

    info!("🔄 Refreshed access token for {}", user.username);

    Ok(Json(RefreshResponse { access_token }))
}

/// Logout endpoint - GET /api/auth/logout (behind auth middleware)
///
/// Revokes the jti of the presented token only. The refresh token
/// issued alongside it at login stays valid until it expires or is
/// revoked on its own.
pub async fn logout(
    State(state): State<AuthState>,
    req: Request,
) -> Result<Json<MessageResponse>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;

    state.revocation.revoke(&claims.jti).map_err(|e| {
        warn!("Failed to revoke jti {}: {}", claims.jti, e);
        AuthApiError::Internal
    })?;

    info!("👋 Logged out: {}", claims.sub);

    Ok(Json(MessageResponse {
        msg: "Successfully logged out".to_string(),
    }))
}

/// List all users - GET /api/users/all (behind auth middleware)
pub async fn list_users(
    State(state): State<AuthState>,
) -> Result<Json<Vec<UserResponse>>, AuthApiError> {
    let users = state.user_store.list_users().map_err(|e| {
        warn!("User listing failed: {}", e);
        AuthApiError::Internal
    })?;

    let response: Vec<UserResponse> = users.iter().map(UserResponse::from_user).collect();

    Ok(Json(response))
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthApiError> {
    let username_len = username.chars().count();
    if username_len < USERNAME_MIN_LEN || username_len > USERNAME_MAX_LEN {
        return Err(AuthApiError::Validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }

    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AuthApiError::Validation(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }

    Ok(())
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    Validation(String),
    DuplicateUser,
    InvalidCredentials,
    Unauthorized,
    Internal,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthApiError::DuplicateUser => {
                (StatusCode::BAD_REQUEST, "Username already exists".to_string())
            }
            AuthApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            AuthApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AuthApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "msg": message }))).into_response()
    }
}
