//! Repositories for `land_classes` and `land_classifications`.

use spmc_core::types::DbId;
use sqlx::PgPool;

use crate::models::land_class::{CreateLandClass, LandClass, LandClassification, UpdateLandClass};

const COLUMNS: &str = "id, name, color, created_at, updated_at";

const LINK_COLUMNS: &str = "id, project_id, land_class_id, created_at, updated_at";

/// Provides CRUD operations for land classes.
///
/// Colours must already be normalized; the table only accepts `#rrggbb`.
pub struct LandClassRepo;

impl LandClassRepo {
    pub async fn create(pool: &PgPool, input: &CreateLandClass) -> Result<LandClass, sqlx::Error> {
        let query = format!(
            "INSERT INTO land_classes (name, color)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LandClass>(&query)
            .bind(&input.name)
            .bind(&input.color)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LandClass>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM land_classes WHERE id = $1");
        sqlx::query_as::<_, LandClass>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<LandClass>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM land_classes ORDER BY name ASC");
        sqlx::query_as::<_, LandClass>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLandClass,
    ) -> Result<Option<LandClass>, sqlx::Error> {
        let query = format!(
            "UPDATE land_classes SET
                name = COALESCE($2, name),
                color = COALESCE($3, color)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LandClass>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM land_classes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Approval of land classes per project.
pub struct LandClassificationRepo;

impl LandClassificationRepo {
    pub async fn approve(
        pool: &PgPool,
        project_id: DbId,
        land_class_id: DbId,
    ) -> Result<LandClassification, sqlx::Error> {
        let query = format!(
            "INSERT INTO land_classifications (project_id, land_class_id)
             VALUES ($1, $2)
             RETURNING {LINK_COLUMNS}"
        );
        sqlx::query_as::<_, LandClassification>(&query)
            .bind(project_id)
            .bind(land_class_id)
            .fetch_one(pool)
            .await
    }

    pub async fn revoke(
        pool: &PgPool,
        project_id: DbId,
        land_class_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM land_classifications WHERE project_id = $1 AND land_class_id = $2",
        )
        .bind(project_id)
        .bind(land_class_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Land classes approved for a project, ordered by name.
    pub async fn list_land_classes(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<LandClass>, sqlx::Error> {
        sqlx::query_as::<_, LandClass>(
            "SELECT lc.id, lc.name, lc.color, lc.created_at, lc.updated_at
             FROM land_classes lc
             JOIN land_classifications lcf ON lcf.land_class_id = lc.id
             WHERE lcf.project_id = $1
             ORDER BY lc.name ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// The ids in `land_class_ids` that are not approved for `project_id`.
    pub async fn unapproved(
        pool: &PgPool,
        project_id: DbId,
        land_class_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT DISTINCT t.id
             FROM UNNEST($2::bigint[]) AS t(id)
             WHERE NOT EXISTS (
                 SELECT 1 FROM land_classifications lcf
                 WHERE lcf.project_id = $1 AND lcf.land_class_id = t.id
             )
             ORDER BY t.id",
        )
        .bind(project_id)
        .bind(land_class_ids)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
