//! `projects`: the top of the project → scene → superpixel hierarchy.

use spmc_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, UpdateProject, DEFAULT_PROJECT_SRID};

const COLUMNS: &str = "id, name, description, srid, created_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    /// Omitted fields take their defaults: an empty description and
    /// [`DEFAULT_PROJECT_SRID`].
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, description, srid)
             VALUES ($1, COALESCE($2, ''), COALESCE($3, $4))
             RETURNING {COLUMNS}"
        ))
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.srid)
        .bind(DEFAULT_PROJECT_SRID)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Alphabetical, which is how the wizard presents them.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects ORDER BY name"))
            .fetch_all(pool)
            .await
    }

    /// Patch name, description and display SRID; absent fields keep their
    /// stored values.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 srid = COALESCE($4, srid)
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .bind(input.srid)
        .fetch_optional(pool)
        .await
    }

    /// Scenes, superpixels, approvals and classifications go with it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();
        Ok(deleted == 1)
    }
}
