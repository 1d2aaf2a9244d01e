//! Handlers for projects and their approved algorithms and land classes.
//!
//! Mutations live under `/admin/projects` and require [`RequireAdmin`];
//! the read-only views under `/projects` accept any authenticated user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use spmc_core::error::CoreError;
use spmc_core::types::DbId;
use spmc_db::models::algorithm::{ApproveAlgorithm, ProjectAlgo, SuperPixelAlgo};
use spmc_db::models::land_class::{ApproveLandClass, LandClass, LandClassification};
use spmc_db::models::project::{CreateProject, Project, UpdateProject};
use spmc_db::models::scene::Scene;
use spmc_db::repositories::{
    AlgorithmRepo, LandClassRepo, LandClassificationRepo, ProjectAlgoRepo, ProjectRepo, SceneRepo,
    SpatialRefRepo,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::state::AppState;

/// POST /api/v1/admin/projects
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    input.validate()?;
    if let Some(srid) = input.srid {
        ensure_srid(&state, srid).await?;
    }

    let project = ProjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_id = project.id, name = %project.name, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<Vec<Project>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<Project>> {
    Ok(Json(find_project(&state, id).await?))
}

/// PUT /api/v1/admin/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<Project>> {
    input.validate()?;
    if let Some(srid) = input.srid {
        ensure_srid(&state, srid).await?;
    }

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("Project", id))?;
    Ok(Json(project))
}

/// DELETE /api/v1/admin/projects/{id}
///
/// Cascades to scenes, superpixels and entries. Tile directories of the
/// deleted scenes are removed afterwards.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let scenes = SceneRepo::list_by_project(&state.pool, id).await?;
    let mut tile_paths = Vec::new();
    for scene in &scenes {
        tile_paths.extend(super::scene::tile_paths_of(&state, scene).await?);
    }

    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found("Project", id));
    }
    tracing::info!(project_id = id, deleted_by = admin.user_id, "Project deleted");

    for path in tile_paths {
        crate::ingest::remove_tiles(&state.config.storage, &path).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/projects/{id}/scenes
pub async fn list_scenes(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<Scene>>> {
    find_project(&state, id).await?;
    let scenes = SceneRepo::list_by_project(&state.pool, id).await?;
    Ok(Json(scenes))
}

/// GET /api/v1/projects/{id}/algorithms
///
/// Algorithms approved for the project.
pub async fn list_algorithms(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<SuperPixelAlgo>>> {
    find_project(&state, id).await?;
    let algos = ProjectAlgoRepo::list_algorithms(&state.pool, id).await?;
    Ok(Json(algos))
}

/// GET /api/v1/projects/{id}/land-classes
///
/// Land classes approved for the project.
pub async fn list_land_classes(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<LandClass>>> {
    find_project(&state, id).await?;
    let classes = LandClassificationRepo::list_land_classes(&state.pool, id).await?;
    Ok(Json(classes))
}

/// POST /api/v1/admin/projects/{id}/algorithms
///
/// Returns 409 if the algorithm is already approved.
pub async fn approve_algorithm(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ApproveAlgorithm>,
) -> AppResult<(StatusCode, Json<ProjectAlgo>)> {
    find_project(&state, id).await?;
    AlgorithmRepo::find_by_id(&state.pool, input.algo_id)
        .await?
        .ok_or(AppError::not_found("SuperPixelAlgo", input.algo_id))?;

    let link = ProjectAlgoRepo::approve(&state.pool, id, input.algo_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// DELETE /api/v1/admin/projects/{id}/algorithms/{algo_id}
pub async fn revoke_algorithm(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, algo_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if ProjectAlgoRepo::revoke(&state.pool, id, algo_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("ProjectAlgo", algo_id))
    }
}

/// POST /api/v1/admin/projects/{id}/land-classes
pub async fn approve_land_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ApproveLandClass>,
) -> AppResult<(StatusCode, Json<LandClassification>)> {
    find_project(&state, id).await?;
    LandClassRepo::find_by_id(&state.pool, input.land_class_id)
        .await?
        .ok_or(AppError::not_found("LandClass", input.land_class_id))?;

    let link = LandClassificationRepo::approve(&state.pool, id, input.land_class_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// DELETE /api/v1/admin/projects/{id}/land-classes/{land_class_id}
pub async fn revoke_land_class(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, land_class_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if LandClassificationRepo::revoke(&state.pool, id, land_class_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("LandClassification", land_class_id))
    }
}

pub(crate) async fn find_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Project", id))
}

/// Reject SRIDs PostGIS cannot transform to.
pub(crate) async fn ensure_srid(state: &AppState, srid: spmc_core::types::Srid) -> AppResult<()> {
    if SpatialRefRepo::exists(&state.pool, srid).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "Unknown spatial reference system EPSG:{srid}"
        ))))
    }
}
