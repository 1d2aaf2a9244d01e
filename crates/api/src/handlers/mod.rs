pub mod admin;
pub mod algorithm;
pub mod auth;
pub mod classification;
pub mod land_class;
pub mod misc_tile;
pub mod navigation;
pub mod project;
pub mod scene;
