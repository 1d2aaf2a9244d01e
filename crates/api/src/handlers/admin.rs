//! Account management under `/admin/users`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use spmc_core::error::CoreError;
use spmc_core::roles::Role;
use spmc_core::types::DbId;
use spmc_db::models::user::{CreateUser, UpdateUser, UserResponse};
use spmc_db::repositories::{SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Classifier
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccountChanges {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct NewPassword {
    pub new_password: String,
}

fn hash_checked(password: &str) -> AppResult<String> {
    validate_password_strength(password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    hash_password(password).map_err(|e| AppError::InternalError(format!("Could not hash password: {e}")))
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<NewAccount>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    input.validate()?;
    let password_hash = hash_checked(&input.password)?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            role: input.role,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, role = %user.role, by = admin.user_id, "Account created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .map(|user| Json(user.into()))
        .ok_or(AppError::not_found("User", id))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<AccountChanges>,
) -> AppResult<Json<UserResponse>> {
    input.validate()?;
    if id == admin.user_id && (input.is_active == Some(false) || input.role == Some(Role::Classifier)) {
        return Err(AppError::BadRequest(
            "Administrators cannot deactivate or demote themselves".into(),
        ));
    }

    let changes = UpdateUser {
        username: input.username,
        email: input.email,
        role: input.role,
        is_active: input.is_active,
    };
    let user = UserRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::not_found("User", id))?;

    if !user.is_active {
        SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }
    Ok(Json(user.into()))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Deactivates rather than deletes, so the user's classifications survive.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "Administrators cannot deactivate their own account".into(),
        ));
    }
    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::not_found("User", id));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    tracing::info!(user_id = id, by = admin.user_id, "Account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/reset-password
///
/// Also lifts any lockout and signs the user out everywhere.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<NewPassword>,
) -> AppResult<StatusCode> {
    let password_hash = hash_checked(&input.new_password)?;
    if !UserRepo::set_password(&state.pool, id, &password_hash).await? {
        return Err(AppError::not_found("User", id));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
