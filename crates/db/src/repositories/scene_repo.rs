//! Repository for the `scenes` table.

use spmc_core::superpixels::SuperpixelUpload;
use spmc_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::scene::{CreateScene, Scene, TileSet, UpdateScene};
use crate::models::superpixel::ImportReport;
use crate::repositories::superpixel_repo::{ImportError, SuperPixelRepo};

/// Column list shared across queries. The bbox is decoded as GeoJSON.
const COLUMNS: &str = "id, project_id, name, description, uuid, tiles_path, \
                        ST_AsGeoJSON(bbox)::jsonb AS bbox, created_at, updated_at";

/// Provides CRUD operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    /// Insert a tiled scene and, optionally, its first superpixel set.
    ///
    /// Both writes share one transaction: a superpixel file that fails the
    /// bounding-box check leaves no scene behind.
    pub async fn create(
        pool: &PgPool,
        input: &CreateScene,
        tiles: &TileSet,
        superpixels: Option<(DbId, &SuperpixelUpload)>,
    ) -> Result<(Scene, Option<ImportReport>), ImportError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO scenes (project_id, name, description, uuid, tiles_path, bbox)
             VALUES ($1, $2, COALESCE($3, ''), $4, $5,
                     ST_Transform(ST_MakeEnvelope($6, $7, $8, $9, $10), 4326))
             RETURNING {COLUMNS}"
        );
        let scene = sqlx::query_as::<_, Scene>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&tiles.uuid)
            .bind(&tiles.tiles_path)
            .bind(tiles.extent.xmin)
            .bind(tiles.extent.ymin)
            .bind(tiles.extent.xmax)
            .bind(tiles.extent.ymax)
            .bind(tiles.srid)
            .fetch_one(&mut *tx)
            .await?;

        let report = match superpixels {
            Some((algo_id, upload)) => Some(
                SuperPixelRepo::import_inner(&mut tx, scene.id, algo_id, upload, false).await?,
            ),
            None => None,
        };

        tx.commit().await?;
        Ok((scene, report))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a scene only if it belongs to `project_id`.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: DbId,
        id: DbId,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1 AND project_id = $2");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's scenes ordered by ID ascending.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE project_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Scene>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update metadata and, with `tiles`, record a fresh tile pyramid.
    ///
    /// Only non-`None` fields in `input` are applied. Both writes share one
    /// transaction.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateScene,
        tiles: Option<&TileSet>,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE scenes SET
                project_id = COALESCE($2, project_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(&mut *tx)
            .await?;

        let updated = match (updated, tiles) {
            (Some(_), Some(tiles)) => Self::set_tiles(&mut tx, id, tiles).await?,
            (updated, _) => updated,
        };

        tx.commit().await?;
        Ok(updated)
    }

    /// Store the tile uuid, path and reprojected bounding box.
    async fn set_tiles(
        conn: &mut PgConnection,
        id: DbId,
        tiles: &TileSet,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET
                uuid = $2,
                tiles_path = $3,
                bbox = ST_Transform(ST_MakeEnvelope($4, $5, $6, $7, $8), 4326)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(&tiles.uuid)
            .bind(&tiles.tiles_path)
            .bind(tiles.extent.xmin)
            .bind(tiles.extent.ymin)
            .bind(tiles.extent.xmax)
            .bind(tiles.extent.ymax)
            .bind(tiles.srid)
            .fetch_optional(conn)
            .await
    }

    /// Delete a scene, returning the removed row so its tiles can be cleaned up.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("DELETE FROM scenes WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
