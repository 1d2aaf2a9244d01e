//! Handlers for auxiliary tile layers attached to a scene.
//!
//! Same upload flow as scenes, without superpixels.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use spmc_core::types::DbId;
use spmc_db::models::misc_tile::{CreateMiscTile, MiscTile, UpdateMiscTile};
use spmc_db::repositories::MiscTileRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::scene::{find_scene, misc_tile_view, validated_name, MiscTileView};
use crate::ingest::{self, UploadForm};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// POST /api/v1/admin/scenes/{scene_id}/misc-tiles
///
/// Multipart fields: `name`, `description?`, `image_file`.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(scene_id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MiscTileView>)> {
    let form = UploadForm::read(multipart).await?;
    let name = validated_name(form.required_text("name")?)?;
    let image = form.required_file("image_file")?;
    find_scene(&state, scene_id).await?;

    let uuid = Uuid::new_v4().to_string();
    let tiles = ingest::tile_raster(&state, image, &uuid).await?;

    let input = CreateMiscTile {
        scene_id,
        name,
        description: form.text("description").map(str::to_string),
    };
    let tile = match MiscTileRepo::create(&state.pool, &input, &tiles).await {
        Ok(tile) => tile,
        Err(e) => {
            ingest::remove_tiles(&state.config.storage, &tiles.tiles_path).await;
            return Err(e.into());
        }
    };
    tracing::info!(misc_tile_id = tile.id, scene_id, uuid = %tiles.uuid, "Misc tile created");

    Ok((StatusCode::CREATED, Json(misc_tile_view(&state, tile))))
}

/// GET /api/v1/admin/scenes/{scene_id}/misc-tiles
pub async fn list_by_scene(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(scene_id): Path<DbId>,
) -> AppResult<Json<Vec<MiscTileView>>> {
    find_scene(&state, scene_id).await?;
    let tiles = MiscTileRepo::list_by_scene(&state.pool, scene_id)
        .await?
        .into_iter()
        .map(|t| misc_tile_view(&state, t))
        .collect();
    Ok(Json(tiles))
}

/// GET /api/v1/admin/misc-tiles/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<MiscTileView>> {
    let tile = find_misc_tile(&state, id).await?;
    Ok(Json(misc_tile_view(&state, tile)))
}

/// PUT /api/v1/admin/misc-tiles/{id}
///
/// Multipart, all fields optional. A new `image_file` replaces the layer's
/// tiles once the row is updated.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<MiscTileView>> {
    let form = UploadForm::read(multipart).await?;
    let existing = find_misc_tile(&state, id).await?;
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

    let input = UpdateMiscTile {
        name,
        description: form.text("description").map(str::to_string),
    };
    let updated =
        MiscTileRepo::update(&state.pool, id, &input, staged.as_ref().map(|s| &s.tiles)).await;
    let tile = match updated {
        Ok(Some(tile)) => tile,
        rejected => {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            return Err(match rejected {
                Err(e) => e.into(),
                _ => not_found(id),
            });
        }
    };

    if let Some(staged) = staged {
        staged.publish(&state.config.storage).await?;
    }

    Ok(Json(misc_tile_view(&state, tile)))
}

/// DELETE /api/v1/admin/misc-tiles/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let tile = MiscTileRepo::delete(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;

    if let Some(path) = tile.tiles_path {
        ingest::remove_tiles(&state.config.storage, &path).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn find_misc_tile(state: &AppState, id: DbId) -> AppResult<MiscTile> {
    MiscTileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(id))
}

fn not_found(id: DbId) -> AppError {
    AppError::not_found("MiscTile", id)
}
