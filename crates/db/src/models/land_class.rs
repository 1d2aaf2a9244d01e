//! Land class models and the project approval link.

use serde::{Deserialize, Serialize};
use spmc_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `land_classes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LandClass {
    pub id: DbId,
    pub name: String,
    /// Normalized `#rrggbb`.
    pub color: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a land class. `color` is normalized before insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLandClass {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLandClass {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub color: Option<String>,
}

/// A row from the `land_classifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LandClassification {
    pub id: DbId,
    pub project_id: DbId,
    pub land_class_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveLandClass {
    pub land_class_id: DbId,
}
