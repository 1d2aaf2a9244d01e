/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// PostGIS spatial reference identifier (EPSG code in practice).
pub type Srid = i32;

/// Storage SRID for every geometry column.
pub const STORAGE_SRID: Srid = 4326;
