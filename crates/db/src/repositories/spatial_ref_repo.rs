//! Lookups against PostGIS's `spatial_ref_sys` catalogue.

use spmc_core::types::Srid;
use sqlx::PgPool;

pub struct SpatialRefRepo;

impl SpatialRefRepo {
    /// Whether PostGIS knows how to transform to/from `srid`.
    pub async fn exists(pool: &PgPool, srid: Srid) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM spatial_ref_sys WHERE srid = $1)")
                .bind(srid)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }
}
