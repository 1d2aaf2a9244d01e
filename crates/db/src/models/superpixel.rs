//! Superpixel read models.

use serde::Serialize;
use spmc_core::types::DbId;
use sqlx::FromRow;

/// One superpixel annotated with the requesting user's classification.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SuperPixelFeature {
    pub id: DbId,
    /// The user's segmentation entry for this superpixel, if any.
    pub entry_id: Option<DbId>,
    pub land_class_id: Option<DbId>,
    /// Only set when the entry's land class is approved for the project.
    pub color: Option<String>,
    /// GeoJSON geometry in the requested SRID.
    pub geometry: serde_json::Value,
}

/// Outcome of a superpixel import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub scene_id: DbId,
    pub algo_id: DbId,
    pub imported: u64,
    /// Number of previously stored superpixels that were removed.
    pub replaced: u64,
}
