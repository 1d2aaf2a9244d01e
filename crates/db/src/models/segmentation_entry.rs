//! Segmentation entry model and DTOs.

use serde::{Deserialize, Serialize};
use spmc_core::classification::EntryAssignment;
use spmc_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `segmentation_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SegmentationEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub scene_id: DbId,
    pub super_pixel_id: DbId,
    pub land_class_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for a batched save.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEntries {
    pub scene_id: DbId,
    pub entries: Vec<EntryAssignment>,
}

/// Request body for saving a single entry.
///
/// With `entry_id` the existing entry is relabelled; without it the entry is
/// upserted on (user, scene, superpixel).
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEntry {
    pub entry_id: Option<DbId>,
    pub scene_id: DbId,
    pub sp_id: DbId,
    pub land_class_id: DbId,
}
