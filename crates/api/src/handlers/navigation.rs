//! Handlers for the per-user select-project → select-scene →
//! select-algorithm wizard.
//!
//! The selection is stored server-side in `user_navigation`; every mutating
//! call returns the resulting [`NavigationState`]. A rejected selection
//! leaves the stored state untouched.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use spmc_core::error::CoreError;
use spmc_core::navigation::{NavigationSelection, NavigationStep};
use spmc_core::types::DbId;
use spmc_db::models::algorithm::SuperPixelAlgo;
use spmc_db::models::land_class::LandClass;
use spmc_db::models::project::Project;
use spmc_db::repositories::{
    AlgorithmRepo, LandClassificationRepo, MiscTileRepo, NavigationRepo, ProjectAlgoRepo,
    ProjectRepo, SceneRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::project::find_project;
use crate::handlers::scene::{misc_tile_view, scene_view, MiscTileView, SceneView};
use crate::middleware::rbac::RequireAuth;
use crate::state::AppState;

/// The stored selection and the step it implies.
#[derive(Debug, Serialize)]
pub struct NavigationState {
    #[serde(flatten)]
    pub selection: NavigationSelection,
    pub step: NavigationStep,
}

impl From<NavigationSelection> for NavigationState {
    fn from(selection: NavigationSelection) -> Self {
        Self {
            step: selection.step(),
            selection,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectProjectRequest {
    pub project_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct SelectSceneRequest {
    pub project_id: Option<DbId>,
    pub scene_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct SelectAlgorithmRequest {
    pub algo_id: Option<DbId>,
}

/// `GET /navigation/scenes` payload. Both parts are null before a project
/// is selected.
#[derive(Debug, Serialize)]
pub struct SceneChoices {
    pub project: Option<Project>,
    pub scenes: Option<Vec<SceneView>>,
}

/// Everything the classification screen needs. Parts not yet selected are
/// null.
#[derive(Debug, Serialize)]
pub struct ClassificationContext {
    pub step: NavigationStep,
    pub project: Option<Project>,
    pub scene: Option<SceneView>,
    pub algorithm: Option<SuperPixelAlgo>,
    /// Land classes approved for the project.
    pub land_classes: Option<Vec<LandClass>>,
    pub misc_tiles: Option<Vec<MiscTileView>>,
}

/// GET /api/v1/navigation
pub async fn get_state(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<NavigationState>> {
    let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;
    Ok(Json(nav.selection().into()))
}

/// POST /api/v1/navigation/project
///
/// Selecting a project clears the scene and algorithm.
pub async fn select_project(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<SelectProjectRequest>,
) -> AppResult<Json<NavigationState>> {
    let project_id = required(input.project_id, "project_id")?;
    find_project(&state, project_id).await?;

    let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;
    let selection = nav.selection().with_project(project_id);
    let saved = NavigationRepo::save(&state.pool, user.user_id, &selection).await?;
    Ok(Json(saved.selection().into()))
}

/// GET /api/v1/navigation/scenes
///
/// Scenes of the selected project, ordered by id.
pub async fn list_scenes(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<SceneChoices>> {
    let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;

    let project = match nav.project_id {
        Some(id) => ProjectRepo::find_by_id(&state.pool, id).await?,
        None => None,
    };
    let Some(project) = project else {
        return Ok(Json(SceneChoices {
            project: None,
            scenes: None,
        }));
    };

    let scenes = SceneRepo::list_by_project(&state.pool, project.id)
        .await?
        .into_iter()
        .map(|s| scene_view(&state, s))
        .collect();

    Ok(Json(SceneChoices {
        project: Some(project),
        scenes: Some(scenes),
    }))
}

/// POST /api/v1/navigation/scene
///
/// Both ids are required and the scene must belong to the project.
/// Selecting a scene clears the algorithm.
pub async fn select_scene(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<SelectSceneRequest>,
) -> AppResult<Json<NavigationState>> {
    let project_id = required(input.project_id, "project_id")?;
    let scene_id = required(input.scene_id, "scene_id")?;

    find_project(&state, project_id).await?;
    SceneRepo::find_in_project(&state.pool, project_id, scene_id)
        .await?
        .ok_or(AppError::not_found("Scene", scene_id))?;

    let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;
    let selection = nav.selection().with_scene(project_id, scene_id);
    let saved = NavigationRepo::save(&state.pool, user.user_id, &selection).await?;
    Ok(Json(saved.selection().into()))
}

/// POST /api/v1/navigation/algorithm
///
/// Requires a selected scene; the algorithm must be approved for the
/// selected project.
pub async fn select_algorithm(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<SelectAlgorithmRequest>,
) -> AppResult<Json<NavigationState>> {
    let algo_id = required(input.algo_id, "algo_id")?;

    let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;
    let selection = nav.selection();
    let (Some(project_id), Some(_)) = (selection.project_id, selection.scene_id) else {
        return Err(AppError::BadRequest(
            "Select a project and a scene before choosing an algorithm".into(),
        ));
    };

    if !ProjectAlgoRepo::is_approved(&state.pool, project_id, algo_id).await? {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Algorithm {algo_id} is not approved for project {project_id}"
        ))));
    }

    let saved =
        NavigationRepo::save(&state.pool, user.user_id, &selection.with_algo(algo_id)).await?;
    Ok(Json(saved.selection().into()))
}

/// GET /api/v1/navigation/classification
pub async fn classification_context(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<ClassificationContext>> {
    let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;
    let selection = nav.selection();

    let project = match selection.project_id {
        Some(id) => ProjectRepo::find_by_id(&state.pool, id).await?,
        None => None,
    };
    let land_classes = match &project {
        Some(p) => Some(LandClassificationRepo::list_land_classes(&state.pool, p.id).await?),
        None => None,
    };

    let scene = match (&project, selection.scene_id) {
        (Some(p), Some(id)) => SceneRepo::find_in_project(&state.pool, p.id, id).await?,
        _ => None,
    };
    let misc_tiles = match &scene {
        Some(s) => Some(
            MiscTileRepo::list_by_scene(&state.pool, s.id)
                .await?
                .into_iter()
                .map(|t| misc_tile_view(&state, t))
                .collect(),
        ),
        None => None,
    };

    let algorithm = match (&scene, selection.algo_id) {
        (Some(_), Some(id)) => AlgorithmRepo::find_by_id(&state.pool, id).await?,
        _ => None,
    };

    Ok(Json(ClassificationContext {
        step: selection.step(),
        project,
        scene: scene.map(|s| scene_view(&state, s)),
        algorithm,
        land_classes,
        misc_tiles,
    }))
}

/// POST /api/v1/navigation/reset
pub async fn reset(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<NavigationState>> {
    let saved =
        NavigationRepo::save(&state.pool, user.user_id, &NavigationSelection::default()).await?;
    Ok(Json(saved.selection().into()))
}

fn required(id: Option<DbId>, field: &str) -> AppResult<DbId> {
    id.ok_or_else(|| AppError::BadRequest(format!("Missing required '{field}' field")))
}
