//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod algorithm_repo;
pub mod land_class_repo;
pub mod misc_tile_repo;
pub mod navigation_repo;
pub mod project_repo;
pub mod scene_repo;
pub mod segmentation_entry_repo;
pub mod session_repo;
pub mod spatial_ref_repo;
pub mod superpixel_repo;
pub mod user_repo;

pub use algorithm_repo::{AlgorithmRepo, ProjectAlgoRepo};
pub use land_class_repo::{LandClassRepo, LandClassificationRepo};
pub use misc_tile_repo::MiscTileRepo;
pub use navigation_repo::NavigationRepo;
pub use project_repo::ProjectRepo;
pub use scene_repo::SceneRepo;
pub use segmentation_entry_repo::SegmentationEntryRepo;
pub use session_repo::SessionRepo;
pub use spatial_ref_repo::SpatialRefRepo;
pub use superpixel_repo::{ImportError, SuperPixelRepo};
pub use user_repo::UserRepo;
