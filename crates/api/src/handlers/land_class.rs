//! Handlers for `/admin/land-classes`.
//!
//! Colours are normalised to lowercase `#rrggbb` before they reach the
//! database.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use spmc_core::error::CoreError;
use spmc_core::land_class::normalize_color;
use spmc_core::types::DbId;
use spmc_db::models::land_class::{CreateLandClass, LandClass, UpdateLandClass};
use spmc_db::repositories::LandClassRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// POST /api/v1/admin/land-classes
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(mut input): Json<CreateLandClass>,
) -> AppResult<(StatusCode, Json<LandClass>)> {
    input.validate()?;
    input.color = color(&input.color)?;

    let class = LandClassRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// GET /api/v1/admin/land-classes
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<LandClass>>> {
    Ok(Json(LandClassRepo::list(&state.pool).await?))
}

/// GET /api/v1/admin/land-classes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<LandClass>> {
    let class = LandClassRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    Ok(Json(class))
}

/// PUT /api/v1/admin/land-classes/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateLandClass>,
) -> AppResult<Json<LandClass>> {
    input.validate()?;
    input.color = input.color.as_deref().map(color).transpose()?;

    let class = LandClassRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(not_found(id))?;
    Ok(Json(class))
}

/// DELETE /api/v1/admin/land-classes/{id}
///
/// Cascades to approvals and to every entry labelled with the class.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if LandClassRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn color(raw: &str) -> AppResult<String> {
    normalize_color(raw).map_err(|msg| AppError::Core(CoreError::Validation(msg)))
}

fn not_found(id: DbId) -> AppError {
    AppError::not_found("LandClass", id)
}
