//! Repository for the `superpixels` table.
//!
//! Geometries are written and read through PostGIS: uploads are parsed from
//! GeoJSON, reprojected to 4326 and checked against the scene bbox in SQL.

use spmc_core::superpixels::{SuperpixelUpload, OUTSIDE_BBOX_MSG};
use spmc_core::types::{DbId, Srid};
use sqlx::{PgConnection, PgPool};

use crate::models::superpixel::{ImportReport, SuperPixelFeature};

/// Why a superpixel import was refused.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{}", OUTSIDE_BBOX_MSG)]
    OutsideBoundingBox { outside: i64 },

    #[error("Superpixels for scene {scene_id} and algorithm {algo_id} already exist")]
    AlreadyImported { scene_id: DbId, algo_id: DbId },

    #[error("Scene {0} has no bounding box yet")]
    SceneNotTiled(DbId),
}

/// Superpixel import and per-user read access.
pub struct SuperPixelRepo;

impl SuperPixelRepo {
    /// Import an uploaded superpixel set for `(scene_id, algo_id)`.
    ///
    /// With `replace` any existing set for the pair is deleted first (which
    /// cascades to its segmentation entries); without it an existing set is
    /// an [`ImportError::AlreadyImported`].
    pub async fn import(
        pool: &PgPool,
        scene_id: DbId,
        algo_id: DbId,
        upload: &SuperpixelUpload,
        replace: bool,
    ) -> Result<ImportReport, ImportError> {
        let mut tx = pool.begin().await?;
        let report = Self::import_inner(&mut tx, scene_id, algo_id, upload, replace).await?;
        tx.commit().await?;
        Ok(report)
    }

    /// Import within a caller-owned transaction. Returning an error leaves
    /// rollback to the caller dropping it.
    pub(crate) async fn import_inner(
        conn: &mut PgConnection,
        scene_id: DbId,
        algo_id: DbId,
        upload: &SuperpixelUpload,
        replace: bool,
    ) -> Result<ImportReport, ImportError> {
        let (tiled,): (bool,) = sqlx::query_as("SELECT bbox IS NOT NULL FROM scenes WHERE id = $1")
            .bind(scene_id)
            .fetch_one(&mut *conn)
            .await?;
        if !tiled {
            return Err(ImportError::SceneNotTiled(scene_id));
        }

        let replaced = if replace {
            sqlx::query("DELETE FROM superpixels WHERE scene_id = $1 AND algo_id = $2")
                .bind(scene_id)
                .bind(algo_id)
                .execute(&mut *conn)
                .await?
                .rows_affected()
        } else {
            let (existing,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM superpixels WHERE scene_id = $1 AND algo_id = $2",
            )
            .bind(scene_id)
            .bind(algo_id)
            .fetch_one(&mut *conn)
            .await?;
            if existing > 0 {
                return Err(ImportError::AlreadyImported { scene_id, algo_id });
            }
            0
        };

        let ids: Vec<(DbId,)> = sqlx::query_as(
            "INSERT INTO superpixels (scene_id, algo_id, geom)
             SELECT $1, $2, ST_Transform(ST_SetSRID(ST_GeomFromGeoJSON(g), $3), 4326)
             FROM UNNEST($4::text[]) AS g
             RETURNING id",
        )
        .bind(scene_id)
        .bind(algo_id)
        .bind(upload.source_srid)
        .bind(&upload.polygons)
        .fetch_all(&mut *conn)
        .await?;
        let ids: Vec<DbId> = ids.into_iter().map(|(id,)| id).collect();

        let (outside,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*)
             FROM superpixels sp
             JOIN scenes s ON s.id = sp.scene_id
             WHERE sp.id = ANY($1) AND NOT ST_Intersects(sp.geom, s.bbox)",
        )
        .bind(&ids)
        .fetch_one(&mut *conn)
        .await?;
        if outside > 0 {
            tracing::info!(scene_id, algo_id, outside, "Rejecting superpixels outside scene bbox");
            return Err(ImportError::OutsideBoundingBox { outside });
        }

        Ok(ImportReport {
            scene_id,
            algo_id,
            imported: ids.len() as u64,
            replaced,
        })
    }

    /// Superpixels of `(scene_id, algo_id)` annotated with `user_id`'s
    /// classification, geometry reprojected to `srid`.
    ///
    /// `color` is only populated when the entry's land class is approved for
    /// the scene's project.
    pub async fn list_for_user(
        pool: &PgPool,
        scene_id: DbId,
        algo_id: DbId,
        user_id: DbId,
        srid: Srid,
    ) -> Result<Vec<SuperPixelFeature>, sqlx::Error> {
        sqlx::query_as::<_, SuperPixelFeature>(
            "SELECT sp.id,
                    e.id AS entry_id,
                    e.land_class_id,
                    lc.color,
                    ST_AsGeoJSON(ST_Transform(sp.geom, $4))::jsonb AS geometry
             FROM superpixels sp
             JOIN scenes s ON s.id = sp.scene_id
             LEFT JOIN segmentation_entries e
                    ON e.super_pixel_id = sp.id AND e.scene_id = sp.scene_id AND e.user_id = $3
             LEFT JOIN land_classifications lcf
                    ON lcf.project_id = s.project_id AND lcf.land_class_id = e.land_class_id
             LEFT JOIN land_classes lc ON lc.id = lcf.land_class_id
             WHERE sp.scene_id = $1 AND sp.algo_id = $2
             ORDER BY sp.id ASC",
        )
        .bind(scene_id)
        .bind(algo_id)
        .bind(user_id)
        .bind(srid)
        .fetch_all(pool)
        .await
    }

    /// The ids in `ids` that are not superpixels of `scene_id`.
    pub async fn missing_from_scene(
        pool: &PgPool,
        scene_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT t.id
             FROM UNNEST($2::bigint[]) AS t(id)
             WHERE NOT EXISTS (
                 SELECT 1 FROM superpixels sp WHERE sp.id = t.id AND sp.scene_id = $1
             )
             ORDER BY t.id",
        )
        .bind(scene_id)
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Number of stored superpixels for a scene and algorithm.
    pub async fn count(pool: &PgPool, scene_id: DbId, algo_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM superpixels WHERE scene_id = $1 AND algo_id = $2",
        )
        .bind(scene_id)
        .bind(algo_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
