//! Repositories for `superpixel_algos` and `project_algos`.

use spmc_core::types::DbId;
use sqlx::PgPool;

use crate::models::algorithm::{CreateAlgorithm, ProjectAlgo, SuperPixelAlgo, UpdateAlgorithm};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

const LINK_COLUMNS: &str = "id, project_id, algo_id, created_at, updated_at";

/// Provides CRUD operations for superpixel algorithms.
pub struct AlgorithmRepo;

impl AlgorithmRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateAlgorithm,
    ) -> Result<SuperPixelAlgo, sqlx::Error> {
        let query = format!(
            "INSERT INTO superpixel_algos (name, description)
             VALUES ($1, COALESCE($2, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SuperPixelAlgo>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SuperPixelAlgo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM superpixel_algos WHERE id = $1");
        sqlx::query_as::<_, SuperPixelAlgo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<SuperPixelAlgo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM superpixel_algos ORDER BY name ASC");
        sqlx::query_as::<_, SuperPixelAlgo>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAlgorithm,
    ) -> Result<Option<SuperPixelAlgo>, sqlx::Error> {
        let query = format!(
            "UPDATE superpixel_algos SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SuperPixelAlgo>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete an algorithm together with its superpixels and approvals.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM superpixel_algos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Approval of algorithms per project.
pub struct ProjectAlgoRepo;

impl ProjectAlgoRepo {
    /// Approve an algorithm for a project. A repeated approval violates
    /// `uq_project_algos_project_algo`.
    pub async fn approve(
        pool: &PgPool,
        project_id: DbId,
        algo_id: DbId,
    ) -> Result<ProjectAlgo, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_algos (project_id, algo_id)
             VALUES ($1, $2)
             RETURNING {LINK_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectAlgo>(&query)
            .bind(project_id)
            .bind(algo_id)
            .fetch_one(pool)
            .await
    }

    /// Returns `true` if an approval was removed.
    pub async fn revoke(pool: &PgPool, project_id: DbId, algo_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_algos WHERE project_id = $1 AND algo_id = $2")
            .bind(project_id)
            .bind(algo_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Algorithms approved for a project, ordered by name.
    pub async fn list_algorithms(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<SuperPixelAlgo>, sqlx::Error> {
        sqlx::query_as::<_, SuperPixelAlgo>(
            "SELECT a.id, a.name, a.description, a.created_at, a.updated_at
             FROM superpixel_algos a
             JOIN project_algos pa ON pa.algo_id = a.id
             WHERE pa.project_id = $1
             ORDER BY a.name ASC",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn is_approved(
        pool: &PgPool,
        project_id: DbId,
        algo_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (approved,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM project_algos WHERE project_id = $1 AND algo_id = $2
             )",
        )
        .bind(project_id)
        .bind(algo_id)
        .fetch_one(pool)
        .await?;
        Ok(approved)
    }
}
