//! Handlers for `/admin/algorithms` (superpixel algorithm catalogue).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use spmc_core::types::DbId;
use spmc_db::models::algorithm::{CreateAlgorithm, SuperPixelAlgo, UpdateAlgorithm};
use spmc_db::repositories::AlgorithmRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// POST /api/v1/admin/algorithms
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateAlgorithm>,
) -> AppResult<(StatusCode, Json<SuperPixelAlgo>)> {
    input.validate()?;
    let algo = AlgorithmRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(algo)))
}

/// GET /api/v1/admin/algorithms
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<SuperPixelAlgo>>> {
    Ok(Json(AlgorithmRepo::list(&state.pool).await?))
}

/// GET /api/v1/admin/algorithms/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<SuperPixelAlgo>> {
    let algo = AlgorithmRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    Ok(Json(algo))
}

/// PUT /api/v1/admin/algorithms/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAlgorithm>,
) -> AppResult<Json<SuperPixelAlgo>> {
    input.validate()?;
    let algo = AlgorithmRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(not_found(id))?;
    Ok(Json(algo))
}

/// DELETE /api/v1/admin/algorithms/{id}
///
/// Cascades to every superpixel produced by the algorithm.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if AlgorithmRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::not_found("SuperPixelAlgo", id)
}
