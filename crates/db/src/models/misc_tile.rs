//! Auxiliary tile layer model and DTOs.

use serde::{Deserialize, Serialize};
use spmc_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `misc_tiles` table: an extra tiled raster shown as an
/// overlay on top of its scene.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MiscTile {
    pub id: DbId,
    pub scene_id: DbId,
    pub name: String,
    pub description: String,
    pub uuid: Option<String>,
    pub tiles_path: Option<String>,
    pub bbox: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMiscTile {
    pub scene_id: DbId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMiscTile {
    pub name: Option<String>,
    pub description: Option<String>,
}
