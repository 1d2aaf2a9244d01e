//! Repository for the `user_navigation` table.

use spmc_core::navigation::NavigationSelection;
use spmc_core::types::DbId;
use sqlx::PgPool;

use crate::models::navigation::UserNavigation;

const COLUMNS: &str = "id, user_id, project_id, scene_id, algo_id, created_at, updated_at";

/// One navigation row per user, created on first access.
pub struct NavigationRepo;

impl NavigationRepo {
    /// Fetch the user's navigation row, inserting an empty one if missing.
    ///
    /// An existing row is only read, so `updated_at` keeps tracking the last
    /// selection change.
    pub async fn get_or_create(pool: &PgPool, user_id: DbId) -> Result<UserNavigation, sqlx::Error> {
        let select = format!("SELECT {COLUMNS} FROM user_navigation WHERE user_id = $1");
        let existing = sqlx::query_as::<_, UserNavigation>(&select)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        if let Some(nav) = existing {
            return Ok(nav);
        }

        sqlx::query(
            "INSERT INTO user_navigation (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        sqlx::query_as::<_, UserNavigation>(&select)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Replace the user's whole selection.
    pub async fn save(
        pool: &PgPool,
        user_id: DbId,
        selection: &NavigationSelection,
    ) -> Result<UserNavigation, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_navigation (user_id, project_id, scene_id, algo_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE \
             SET project_id = EXCLUDED.project_id, \
                 scene_id = EXCLUDED.scene_id, \
                 algo_id = EXCLUDED.algo_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserNavigation>(&query)
            .bind(user_id)
            .bind(selection.project_id)
            .bind(selection.scene_id)
            .bind(selection.algo_id)
            .fetch_one(pool)
            .await
    }
}
