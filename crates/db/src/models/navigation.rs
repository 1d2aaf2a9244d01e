//! Per-user navigation state.

use serde::Serialize;
use spmc_core::navigation::NavigationSelection;
use spmc_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `user_navigation` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserNavigation {
    pub id: DbId,
    pub user_id: DbId,
    pub project_id: Option<DbId>,
    pub scene_id: Option<DbId>,
    pub algo_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserNavigation {
    pub fn selection(&self) -> NavigationSelection {
        NavigationSelection {
            project_id: self.project_id,
            scene_id: self.scene_id,
            algo_id: self.algo_id,
        }
    }
}
