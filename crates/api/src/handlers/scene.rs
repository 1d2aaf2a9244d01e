//! Handlers for scenes: raster upload, re-tiling, superpixel import and the
//! scene detail view.
//!
//! Uploads are multipart forms. A raster is always tiled before the row is
//! written, and the tile directory is removed again if the write fails.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use spmc_core::error::CoreError;
use spmc_core::types::DbId;
use spmc_db::models::misc_tile::MiscTile;
use spmc_db::models::scene::{CreateScene, Scene, UpdateScene};
use spmc_db::models::superpixel::ImportReport;
use spmc_db::repositories::{AlgorithmRepo, MiscTileRepo, SceneRepo, SuperPixelRepo};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::project::find_project;
use crate::ingest::{self, UploadForm};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 255;

/// A scene plus the URL template its tiles are served under.
#[derive(Debug, Serialize)]
pub struct SceneView {
    #[serde(flatten)]
    pub scene: Scene,
    pub tile_url: Option<String>,
}

/// A misc tile layer plus its tile URL template.
#[derive(Debug, Serialize)]
pub struct MiscTileView {
    #[serde(flatten)]
    pub tile: MiscTile,
    pub tile_url: Option<String>,
}

/// `GET /scenes/{id}` payload.
#[derive(Debug, Serialize)]
pub struct SceneDetail {
    #[serde(flatten)]
    pub scene: SceneView,
    pub misc_tiles: Vec<MiscTileView>,
}

/// `POST /admin/scenes` payload.
#[derive(Debug, Serialize)]
pub struct SceneCreated {
    #[serde(flatten)]
    pub scene: SceneView,
    /// Present when a superpixel file was uploaded with the raster.
    pub superpixels: Option<ImportReport>,
}

/// POST /api/v1/admin/scenes
///
/// Multipart fields: `project_id`, `name`, `description?`, `image_file`,
/// `superpixels_file?`, `algo_id?` (required with `superpixels_file`).
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<SceneCreated>)> {
    let form = UploadForm::read(multipart).await?;

    let project_id = form.required_id("project_id")?;
    let name = validated_name(form.required_text("name")?)?;
    let image = form.required_file("image_file")?;
    find_project(&state, project_id).await?;

    // Validate the cheap input before spending time on tiling.
    let superpixels = match form.file("superpixels_file") {
        Some(file) => {
            let algo_id = form.id("algo_id")?.ok_or_else(|| {
                AppError::BadRequest("Field 'algo_id' is required with 'superpixels_file'".into())
            })?;
            find_algorithm(&state, algo_id).await?;
            Some((algo_id, ingest::parse_superpixel_file(&state, file).await?))
        }
        None => None,
    };

    let uuid = Uuid::new_v4().to_string();
    let tiles = ingest::tile_raster(&state, image, &uuid).await?;

    let input = CreateScene {
        project_id,
        name,
        description: form.text("description").map(str::to_string),
    };
    let created = SceneRepo::create(
        &state.pool,
        &input,
        &tiles,
        superpixels.as_ref().map(|(algo_id, upload)| (*algo_id, upload)),
    )
    .await;

    let (scene, report) = match created {
        Ok(created) => created,
        Err(e) => {
            ingest::remove_tiles(&state.config.storage, &tiles.tiles_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        scene_id = scene.id,
        project_id,
        uuid = %tiles.uuid,
        superpixels = report.as_ref().map(|r| r.imported),
        created_by = admin.user_id,
        "Scene created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SceneCreated {
            scene: scene_view(&state, scene),
            superpixels: report,
        }),
    ))
}

/// PUT /api/v1/admin/scenes/{id}
///
/// Multipart with every field optional. A new `image_file` is tiled aside
/// and replaces the scene's uuid directory (a fresh uuid if it has none)
/// once the row is updated.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<SceneView>> {
    let form = UploadForm::read(multipart).await?;
    let existing = find_scene(&state, id).await?;

    let project_id = form.id("project_id")?;
    if let Some(project_id) = project_id {
        find_project(&state, project_id).await?;
    }
    let name = form.text("name").map(validated_name).transpose()?;

    let staged = match form.file("image_file") {
        Some(image) => {
            let uuid = existing
                .uuid
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            Some(ingest::retile_raster(&state, image, &uuid).await?)
        }
        None => None,
    };

    let input = UpdateScene {
        project_id,
        name,
        description: form.text("description").map(str::to_string),
    };
    let updated =
        SceneRepo::update(&state.pool, id, &input, staged.as_ref().map(|s| &s.tiles)).await;
    let scene = match updated {
        Ok(Some(scene)) => scene,
        rejected => {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            return Err(match rejected {
                Err(e) => e.into(),
                _ => AppError::not_found("Scene", id),
            });
        }
    };

    if let Some(staged) = staged {
        let uuid = staged.tiles.uuid.clone();
        staged.publish(&state.config.storage).await?;
        tracing::info!(scene_id = id, uuid = %uuid, "Scene re-tiled");
    }

    Ok(Json(scene_view(&state, scene)))
}

/// DELETE /api/v1/admin/scenes/{id}
///
/// Cascades to misc tiles, superpixels and entries, then removes the tile
/// directories of the scene and its misc tiles.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let scene = find_scene(&state, id).await?;
    let tile_paths = tile_paths_of(&state, &scene).await?;

    SceneRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Scene", id))?;
    tracing::info!(scene_id = id, deleted_by = admin.user_id, "Scene deleted");

    for path in tile_paths {
        ingest::remove_tiles(&state.config.storage, &path).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/scenes/{id}/superpixels
///
/// Multipart fields: `algo_id`, `superpixels_file`, `replace?`. Without
/// `replace` an existing set for the algorithm is a 409.
pub async fn import_superpixels(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ImportReport>)> {
    let form = UploadForm::read(multipart).await?;
    let algo_id = form.required_id("algo_id")?;
    let file = form.required_file("superpixels_file")?;
    let replace = form.flag("replace");

    find_scene(&state, id).await?;
    find_algorithm(&state, algo_id).await?;
    let upload = ingest::parse_superpixel_file(&state, file).await?;

    let report = SuperPixelRepo::import(&state.pool, id, algo_id, &upload, replace).await?;
    tracing::info!(
        scene_id = id,
        algo_id,
        imported = report.imported,
        replaced = report.replaced,
        "Superpixels imported"
    );
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/scenes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<SceneDetail>> {
    let scene = find_scene(&state, id).await?;
    Ok(Json(scene_detail(&state, scene).await?))
}

pub(crate) async fn scene_detail(state: &AppState, scene: Scene) -> AppResult<SceneDetail> {
    let misc_tiles = MiscTileRepo::list_by_scene(&state.pool, scene.id)
        .await?
        .into_iter()
        .map(|tile| misc_tile_view(state, tile))
        .collect();

    Ok(SceneDetail {
        scene: scene_view(state, scene),
        misc_tiles,
    })
}

pub(crate) fn scene_view(state: &AppState, scene: Scene) -> SceneView {
    let tile_url = scene
        .tiles_path
        .as_deref()
        .map(|path| ingest::tile_url_template(&state.config.storage, path));
    SceneView { scene, tile_url }
}

pub(crate) fn misc_tile_view(state: &AppState, tile: MiscTile) -> MiscTileView {
    let tile_url = tile
        .tiles_path
        .as_deref()
        .map(|path| ingest::tile_url_template(&state.config.storage, path));
    MiscTileView { tile, tile_url }
}

/// Media-relative tile directories owned by a scene and its misc tiles.
pub(crate) async fn tile_paths_of(state: &AppState, scene: &Scene) -> AppResult<Vec<String>> {
    let misc = MiscTileRepo::list_by_scene(&state.pool, scene.id).await?;
    Ok(scene
        .tiles_path
        .iter()
        .cloned()
        .chain(misc.into_iter().filter_map(|t| t.tiles_path))
        .collect())
}

pub(crate) async fn find_scene(state: &AppState, id: DbId) -> AppResult<Scene> {
    SceneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("Scene", id))
}

async fn find_algorithm(state: &AppState, id: DbId) -> AppResult<()> {
    AlgorithmRepo::find_by_id(&state.pool, id)
        .await?
        .map(|_| ())
        .ok_or(AppError::not_found("SuperPixelAlgo", id))
}

pub(crate) fn validated_name(name: &str) -> AppResult<String> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        ))));
    }
    Ok(name.to_string())
}
