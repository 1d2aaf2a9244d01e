//! Scene entity model and DTOs.

use serde::{Deserialize, Serialize};
use spmc_core::raster::BoundingBox;
use spmc_core::types::{DbId, Srid, Timestamp};
use sqlx::FromRow;

/// A scene row from the `scenes` table.
///
/// `uuid`, `tiles_path` and `bbox` stay `NULL` until the raster has been
/// tiled successfully.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub description: String,
    pub uuid: Option<String>,
    pub tiles_path: Option<String>,
    /// Bounding box as a GeoJSON Polygon in EPSG:4326.
    pub bbox: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new scene.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScene {
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
}

/// DTO for updating an existing scene. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScene {
    pub project_id: Option<DbId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Result of a successful tiling run, stored on scenes and misc tiles.
#[derive(Debug, Clone)]
pub struct TileSet {
    pub uuid: String,
    /// Tile directory relative to the media root, e.g. `tiles/<uuid>`.
    pub tiles_path: String,
    /// Raster extent in the raster's own coordinate system.
    pub extent: BoundingBox,
    /// SRID of `extent`; PostGIS reprojects it to 4326 on write.
    pub srid: Srid,
}
