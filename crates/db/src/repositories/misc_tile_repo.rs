//! Repository for the `misc_tiles` table.

use spmc_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::misc_tile::{CreateMiscTile, MiscTile, UpdateMiscTile};
use crate::models::scene::TileSet;

const COLUMNS: &str = "id, scene_id, name, description, uuid, tiles_path, \
                        ST_AsGeoJSON(bbox)::jsonb AS bbox, created_at, updated_at";

/// Provides CRUD operations for auxiliary tile layers.
pub struct MiscTileRepo;

impl MiscTileRepo {
    /// Insert an already-tiled layer.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMiscTile,
        tiles: &TileSet,
    ) -> Result<MiscTile, sqlx::Error> {
        let query = format!(
            "INSERT INTO misc_tiles (scene_id, name, description, uuid, tiles_path, bbox)
             VALUES ($1, $2, COALESCE($3, ''), $4, $5,
                     ST_Transform(ST_MakeEnvelope($6, $7, $8, $9, $10), 4326))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MiscTile>(&query)
            .bind(input.scene_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&tiles.uuid)
            .bind(&tiles.tiles_path)
            .bind(tiles.extent.xmin)
            .bind(tiles.extent.ymin)
            .bind(tiles.extent.xmax)
            .bind(tiles.extent.ymax)
            .bind(tiles.srid)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MiscTile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM misc_tiles WHERE id = $1");
        sqlx::query_as::<_, MiscTile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the layers of a scene ordered by ID ascending.
    pub async fn list_by_scene(pool: &PgPool, scene_id: DbId) -> Result<Vec<MiscTile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM misc_tiles WHERE scene_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, MiscTile>(&query)
            .bind(scene_id)
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
        input: &UpdateMiscTile,
        tiles: Option<&TileSet>,
    ) -> Result<Option<MiscTile>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE misc_tiles SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, MiscTile>(&query)
            .bind(id)
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
    ) -> Result<Option<MiscTile>, sqlx::Error> {
        let query = format!(
            "UPDATE misc_tiles SET
                uuid = $2,
                tiles_path = $3,
                bbox = ST_Transform(ST_MakeEnvelope($4, $5, $6, $7, $8), 4326)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MiscTile>(&query)
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

    /// Delete a layer, returning the removed row.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<MiscTile>, sqlx::Error> {
        let query = format!("DELETE FROM misc_tiles WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, MiscTile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
