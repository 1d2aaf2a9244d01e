//! Session endpoints: login, refresh-token rotation and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use spmc_core::error::CoreError;
use spmc_db::models::user::{User, UserResponse};
use spmc_db::repositories::{SessionRepo, UserRepo};

use crate::auth::jwt::{issue_access_token, refresh_token_digest, RefreshToken};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const MAX_FAILED_ATTEMPTS: i32 = 5;
const LOCKOUT_MINS: i64 = 15;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let Some(user) = UserRepo::find_by_username(&state.pool, &input.username).await? else {
        return Err(bad_credentials());
    };
    ensure_can_sign_in(&user)?;
    if user.is_locked(Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Too many failed attempts; the account is locked for now".into(),
        )));
    }

    let matches = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Stored password hash unreadable: {e}")))?;
    if !matches {
        let locked = UserRepo::record_failed_login(
            &state.pool,
            user.id,
            MAX_FAILED_ATTEMPTS,
            chrono::Duration::minutes(LOCKOUT_MINS),
        )
        .await?;
        if let Some(until) = locked {
            tracing::warn!(user_id = user.id, %until, "Locking account after failed logins");
        }
        return Err(bad_credentials());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    SessionRepo::prune_for_user(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, role = %user.role, "Signed in");

    start_session(&state, user).await.map(Json)
}

/// POST /api/v1/auth/refresh
///
/// The presented token is spent whether or not a new one can be issued.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let digest = refresh_token_digest(&input.refresh_token);
    let session = SessionRepo::consume(&state.pool, &digest)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Refresh token is invalid, expired or already used".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account no longer exists".into())))?;
    ensure_can_sign_in(&user)?;

    start_session(&state, user).await.map(Json)
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<AppState>, caller: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, caller.user_id).await?;
    tracing::info!(user_id = caller.user_id, revoked, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}

fn bad_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

fn ensure_can_sign_in(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "This account has been deactivated".into(),
        )))
    }
}

async fn start_session(state: &AppState, user: User) -> AppResult<TokenResponse> {
    let jwt = &state.config.jwt;
    let access_token = issue_access_token(user.id, user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Could not sign access token: {e}")))?;

    let refresh = RefreshToken::generate();
    SessionRepo::issue(&state.pool, user.id, &refresh.digest, Utc::now() + jwt.refresh_ttl())
        .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token: refresh.plaintext,
        expires_in: jwt.access_ttl().num_seconds(),
        user: user.into(),
    })
}
