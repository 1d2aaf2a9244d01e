//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Geometry columns are never decoded as binary; queries select them through
//! `ST_AsGeoJSON(..)::jsonb` and they surface here as `serde_json::Value`.

pub mod algorithm;
pub mod land_class;
pub mod misc_tile;
pub mod navigation;
pub mod project;
pub mod scene;
pub mod segmentation_entry;
pub mod session;
pub mod superpixel;
pub mod user;
