//! Domain types and logic for the superpixel map classification service.
//!
//! Nothing here touches the database. Modules that call out to GDAL tools
//! ([`raster`], [`tiling`]) do so through `tokio::process`.

pub mod classification;
pub mod error;
pub mod land_class;
pub mod navigation;
pub mod raster;
pub mod roles;
pub mod superpixels;
pub mod tiling;
pub mod types;
