//! Handlers for `/classification`: superpixels as GeoJSON and the caller's
//! segmentation entries.
//!
//! Scene and algorithm ids may be omitted, in which case the caller's
//! navigation selection is used.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::Deserialize;
use serde_json::json;
use spmc_core::classification::{normalize_entries, EntryAssignment};
use spmc_core::error::CoreError;
use spmc_core::types::{DbId, Srid, STORAGE_SRID};
use spmc_db::models::scene::Scene;
use spmc_db::models::segmentation_entry::{SaveEntries, SaveEntry, SegmentationEntry};
use spmc_db::models::superpixel::SuperPixelFeature;
use spmc_db::repositories::{
    LandClassificationRepo, NavigationRepo, ProjectRepo, SegmentationEntryRepo, SuperPixelRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::project::ensure_srid;
use crate::handlers::scene::find_scene;
use crate::middleware::rbac::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuperpixelQuery {
    pub scene_id: Option<DbId>,
    pub algo_id: Option<DbId>,
    pub srid: Option<Srid>,
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub scene_id: Option<DbId>,
}

/// GET /api/v1/classification/superpixels?scene_id&algo_id&srid
///
/// Returns a FeatureCollection with `id, entry_id, land_class_id, color`
/// properties. `srid` defaults to the project's display SRID.
pub async fn superpixels(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<SuperpixelQuery>,
) -> AppResult<Json<FeatureCollection>> {
    let (scene_id, algo_id) = match (query.scene_id, query.algo_id) {
        (Some(scene_id), Some(algo_id)) => (scene_id, algo_id),
        (scene_id, algo_id) => {
            let nav = NavigationRepo::get_or_create(&state.pool, user.user_id).await?;
            (
                scene_id.or(nav.scene_id).ok_or_else(|| missing("scene_id"))?,
                algo_id.or(nav.algo_id).ok_or_else(|| missing("algo_id"))?,
            )
        }
    };

    let scene = find_scene(&state, scene_id).await?;
    let srid = match query.srid {
        Some(srid) => srid,
        None => ProjectRepo::find_by_id(&state.pool, scene.project_id)
            .await?
            .map(|p| p.srid)
            .unwrap_or(STORAGE_SRID),
    };
    ensure_srid(&state, srid).await?;

    let rows = SuperPixelRepo::list_for_user(&state.pool, scene_id, algo_id, user.user_id, srid)
        .await?;
    tracing::debug!(scene_id, algo_id, srid, count = rows.len(), "Serving superpixels");

    Ok(Json(feature_collection(rows, srid)?))
}

/// PUT /api/v1/classification/entries
///
/// Batched upsert of the caller's labels for one scene. Every superpixel
/// must belong to the scene and every land class must be approved for the
/// scene's project; otherwise nothing is written.
pub async fn save_entries(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<SaveEntries>,
) -> AppResult<Json<Vec<SegmentationEntry>>> {
    let entries = normalize_entries(&input.entries)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let scene = find_scene(&state, input.scene_id).await?;
    check_assignments(&state, &scene, &entries).await?;

    let saved =
        SegmentationEntryRepo::upsert_batch(&state.pool, user.user_id, scene.id, &entries).await?;
    tracing::info!(
        user_id = user.user_id,
        scene_id = scene.id,
        saved = saved.len(),
        "Classification entries saved"
    );
    Ok(Json(saved))
}

/// POST /api/v1/classification/entries/one
///
/// With `entry_id` the caller's existing entry is relabelled (404 when it is
/// not theirs or does not match the scene and superpixel); without it the
/// entry is upserted.
pub async fn save_entry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<SaveEntry>,
) -> AppResult<Json<SegmentationEntry>> {
    let scene = find_scene(&state, input.scene_id).await?;
    let assignment = EntryAssignment {
        super_pixel_id: input.sp_id,
        land_class_id: input.land_class_id,
    };
    check_assignments(&state, &scene, &[assignment]).await?;

    let entry = match input.entry_id {
        Some(id) => {
            SegmentationEntryRepo::relabel(&state.pool, id, user.user_id, scene.id, assignment)
                .await?
                .ok_or(AppError::not_found("SegmentationEntry", id))?
        }
        None => {
            SegmentationEntryRepo::upsert_one(&state.pool, user.user_id, scene.id, assignment)
                .await?
        }
    };
    Ok(Json(entry))
}

/// GET /api/v1/classification/entries?scene_id
pub async fn list_entries(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<EntriesQuery>,
) -> AppResult<Json<Vec<SegmentationEntry>>> {
    let scene_id = match query.scene_id {
        Some(id) => id,
        None => NavigationRepo::get_or_create(&state.pool, user.user_id)
            .await?
            .scene_id
            .ok_or_else(|| missing("scene_id"))?,
    };
    find_scene(&state, scene_id).await?;

    let entries = SegmentationEntryRepo::list_for_user(&state.pool, user.user_id, scene_id).await?;
    Ok(Json(entries))
}

/// DELETE /api/v1/classification/entries/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if SegmentationEntryRepo::delete_for_user(&state.pool, id, user.user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("SegmentationEntry", id))
    }
}

async fn check_assignments(
    state: &AppState,
    scene: &Scene,
    entries: &[EntryAssignment],
) -> AppResult<()> {
    let sp_ids: Vec<DbId> = entries.iter().map(|e| e.super_pixel_id).collect();
    let foreign = SuperPixelRepo::missing_from_scene(&state.pool, scene.id, &sp_ids).await?;
    if !foreign.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Superpixels {foreign:?} do not belong to scene {}",
            scene.id
        )));
    }

    let class_ids: Vec<DbId> = entries.iter().map(|e| e.land_class_id).collect();
    let unapproved =
        LandClassificationRepo::unapproved(&state.pool, scene.project_id, &class_ids).await?;
    if !unapproved.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Land classes {unapproved:?} are not approved for project {}",
            scene.project_id
        )));
    }
    Ok(())
}

/// Build the client-facing collection. A non-WGS 84 SRID is announced with
/// a legacy `crs` member.
fn feature_collection(rows: Vec<SuperPixelFeature>, srid: Srid) -> AppResult<FeatureCollection> {
    let features = rows
        .into_iter()
        .map(|row| {
            let geometry = Geometry::from_json_value(row.geometry)
                .map_err(|e| AppError::InternalError(format!("Invalid stored geometry: {e}")))?;

            let mut properties = JsonObject::new();
            properties.insert("id".into(), json!(row.id));
            properties.insert("entry_id".into(), json!(row.entry_id));
            properties.insert("land_class_id".into(), json!(row.land_class_id));
            properties.insert("color".into(), json!(row.color));

            Ok(Feature {
                bbox: None,
                geometry: Some(geometry),
                id: Some(geojson::feature::Id::Number(row.id.into())),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let foreign_members = (srid != STORAGE_SRID).then(|| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".into(),
            json!({ "type": "name", "properties": { "name": format!("EPSG:{srid}") } }),
        );
        members
    });

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    })
}

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!(
        "Missing '{field}': pass it explicitly or select it in the navigation first"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: DbId, color: Option<&str>) -> SuperPixelFeature {
        SuperPixelFeature {
            id,
            entry_id: color.map(|_| id * 10),
            land_class_id: color.map(|_| 3),
            color: color.map(str::to_string),
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
            }),
        }
    }

    #[test]
    fn test_features_carry_classification_properties() {
        let fc = feature_collection(vec![row(1, Some("#a51d2d")), row(2, None)], 4326).unwrap();
        assert_eq!(fc.features.len(), 2);
        assert!(fc.foreign_members.is_none());

        let value = serde_json::to_value(&fc).unwrap();
        let first = &value["features"][0]["properties"];
        assert_eq!(first["id"], 1);
        assert_eq!(first["entry_id"], 10);
        assert_eq!(first["land_class_id"], 3);
        assert_eq!(first["color"], "#a51d2d");

        let second = &value["features"][1]["properties"];
        assert!(second["entry_id"].is_null());
        assert!(second["color"].is_null());
    }

    #[test]
    fn test_projected_output_declares_crs() {
        let fc = feature_collection(vec![row(1, None)], 3857).unwrap();
        let value = serde_json::to_value(&fc).unwrap();
        assert_eq!(value["crs"]["properties"]["name"], "EPSG:3857");
    }

    #[test]
    fn test_bad_geometry_is_internal_error() {
        let mut bad = row(1, None);
        bad.geometry = json!({ "type": "Nonsense" });
        assert!(matches!(
            feature_collection(vec![bad], 4326),
            Err(AppError::InternalError(_))
        ));
    }
}
