//! Repository for the `segmentation_entries` table.

use spmc_core::classification::EntryAssignment;
use spmc_core::types::DbId;
use sqlx::PgPool;

use crate::models::segmentation_entry::SegmentationEntry;

const COLUMNS: &str = "id, user_id, scene_id, super_pixel_id, land_class_id, created_at, updated_at";

/// Per-user classification entries.
pub struct SegmentationEntryRepo;

impl SegmentationEntryRepo {
    /// Upsert a batch of assignments for one user and scene in one statement.
    ///
    /// `entries` must not repeat a superpixel id (PostgreSQL refuses to touch
    /// the same row twice in one `ON CONFLICT` statement); run them through
    /// `normalize_entries` first.
    pub async fn upsert_batch(
        pool: &PgPool,
        user_id: DbId,
        scene_id: DbId,
        entries: &[EntryAssignment],
    ) -> Result<Vec<SegmentationEntry>, sqlx::Error> {
        let (sp_ids, class_ids): (Vec<DbId>, Vec<DbId>) = entries
            .iter()
            .map(|e| (e.super_pixel_id, e.land_class_id))
            .unzip();

        let query = format!(
            "INSERT INTO segmentation_entries (user_id, scene_id, super_pixel_id, land_class_id)
             SELECT $1, $2, t.sp, t.lc
             FROM UNNEST($3::bigint[], $4::bigint[]) AS t(sp, lc)
             ON CONFLICT ON CONSTRAINT uq_segmentation_entries_user_scene_sp
             DO UPDATE SET land_class_id = EXCLUDED.land_class_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SegmentationEntry>(&query)
            .bind(user_id)
            .bind(scene_id)
            .bind(&sp_ids)
            .bind(&class_ids)
            .fetch_all(pool)
            .await
    }

    /// Upsert one assignment on (user, scene, superpixel).
    pub async fn upsert_one(
        pool: &PgPool,
        user_id: DbId,
        scene_id: DbId,
        assignment: EntryAssignment,
    ) -> Result<SegmentationEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO segmentation_entries (user_id, scene_id, super_pixel_id, land_class_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT uq_segmentation_entries_user_scene_sp
             DO UPDATE SET land_class_id = EXCLUDED.land_class_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SegmentationEntry>(&query)
            .bind(user_id)
            .bind(scene_id)
            .bind(assignment.super_pixel_id)
            .bind(assignment.land_class_id)
            .fetch_one(pool)
            .await
    }

    /// Relabel an existing entry owned by `user_id`.
    ///
    /// Returns `None` if the entry does not exist, belongs to someone else,
    /// or is not the entry for `(scene_id, super_pixel_id)`.
    pub async fn relabel(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        scene_id: DbId,
        assignment: EntryAssignment,
    ) -> Result<Option<SegmentationEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE segmentation_entries SET land_class_id = $5
             WHERE id = $1 AND user_id = $2 AND scene_id = $3 AND super_pixel_id = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SegmentationEntry>(&query)
            .bind(id)
            .bind(user_id)
            .bind(scene_id)
            .bind(assignment.super_pixel_id)
            .bind(assignment.land_class_id)
            .fetch_optional(pool)
            .await
    }

    /// A user's entries for a scene, ordered by superpixel id.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        scene_id: DbId,
    ) -> Result<Vec<SegmentationEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM segmentation_entries
             WHERE user_id = $1 AND scene_id = $2
             ORDER BY super_pixel_id ASC"
        );
        sqlx::query_as::<_, SegmentationEntry>(&query)
            .bind(user_id)
            .bind(scene_id)
            .fetch_all(pool)
            .await
    }

    /// Delete an entry owned by `user_id`. Returns `true` if a row was removed.
    pub async fn delete_for_user(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM segmentation_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
