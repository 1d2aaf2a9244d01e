//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use spmc_core::types::{DbId, Srid, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// SRID used for map display when a project does not specify one.
pub const DEFAULT_PROJECT_SRID: Srid = 3857;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: String,
    /// Spatial reference superpixels are returned in by default.
    pub srid: Srid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    /// Defaults to [`DEFAULT_PROJECT_SRID`] if omitted.
    #[validate(range(min = 1, max = 998999))]
    pub srid: Option<Srid>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 998999))]
    pub srid: Option<Srid>,
}
