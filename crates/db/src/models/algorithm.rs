//! Superpixel algorithm models and the project approval link.

use serde::{Deserialize, Serialize};
use spmc_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `superpixel_algos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SuperPixelAlgo {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAlgorithm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAlgorithm {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A row from the `project_algos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectAlgo {
    pub id: DbId,
    pub project_id: DbId,
    pub algo_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for approving an algorithm within a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ApproveAlgorithm {
    pub algo_id: DbId,
}
