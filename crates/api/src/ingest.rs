//! Upload handling shared by the scene and misc-tile handlers.
//!
//! Rasters go through probe → dry-run → full tiling before anything is
//! written to the database. Superpixel files are validated structurally here;
//! the bounding-box check happens inside the import transaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::Multipart;
use spmc_core::raster::{probe_raster, RasterError};
use spmc_core::superpixels::{parse_superpixels, SuperpixelUpload};
use spmc_core::tiling::{
    check_raster, generate_tiles, tiles_dir, TilingError, RASTER_CHECK_FAILED_MSG, TILES_DIR,
    TILING_FAILED_MSG,
};
use spmc_core::types::DbId;
use spmc_db::models::scene::TileSet;
use spmc_db::repositories::SpatialRefRepo;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedFile {
    /// Lowercased extension of the client-side file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// A fully buffered multipart form.
///
/// Parts with a file name are kept as files, everything else as text.
/// Empty parts (a browser's unselected file input, a blank text box) are
/// treated as absent.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    if !data.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, data });
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        form.fields.insert(name, text.to_string());
                    }
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn required_text(&self, name: &str) -> AppResult<&str> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required '{name}' field")))
    }

    pub fn id(&self, name: &str) -> AppResult<Option<DbId>> {
        self.text(name)
            .map(|raw| {
                raw.parse::<DbId>().map_err(|_| {
                    AppError::BadRequest(format!("Field '{name}' must be an integer id"))
                })
            })
            .transpose()
    }

    pub fn required_id(&self, name: &str) -> AppResult<DbId> {
        self.id(name)?
            .ok_or_else(|| AppError::BadRequest(format!("Missing required '{name}' field")))
    }

    /// Checkbox-style flag: `true`, `1`, `on` and `yes` are set.
    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "1" | "on" | "yes")
        )
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn required_file(&self, name: &str) -> AppResult<&UploadedFile> {
        self.file(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required '{name}' field")))
    }
}

/// Sub-directory of the media root holding tiles that are not served yet.
const STAGING_DIR: &str = ".staging";

/// Write an upload to a temporary file that keeps its extension.
///
/// GDAL picks drivers partly by extension. The file is deleted when the
/// returned handle is dropped.
pub async fn stage_upload(file: &UploadedFile) -> AppResult<NamedTempFile> {
    let suffix = file
        .extension()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let staged = tempfile::Builder::new()
        .prefix("spmc-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| AppError::InternalError(format!("Failed to create staging file: {e}")))?;

    tokio::fs::write(staged.path(), &file.data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to stage upload: {e}")))?;

    Ok(staged)
}

/// Inspect, validate and tile an uploaded raster into `tiles/<uuid>`.
///
/// Nothing is left on disk when this fails.
pub async fn tile_raster(state: &AppState, file: &UploadedFile, uuid: &str) -> AppResult<TileSet> {
    let output_dir = tiles_dir(&state.config.storage.media_root, uuid);
    tile_raster_into(state, file, uuid, &output_dir).await
}

/// Tiles for a layer that is already served, kept in a staging directory
/// until [`StagedTiles::publish`] moves them over `tiles/<uuid>`.
#[derive(Debug)]
pub struct StagedTiles {
    pub tiles: TileSet,
    dir: PathBuf,
}

/// Like [`tile_raster`], but leaves the current `tiles/<uuid>` directory
/// alone.
pub async fn retile_raster(
    state: &AppState,
    file: &UploadedFile,
    uuid: &str,
) -> AppResult<StagedTiles> {
    let dir = state
        .config
        .storage
        .media_root
        .join(STAGING_DIR)
        .join(Uuid::new_v4().to_string());
    let tiles = tile_raster_into(state, file, uuid, &dir).await?;
    Ok(StagedTiles { tiles, dir })
}

impl StagedTiles {
    /// Swap the staged pyramid into place. The previous one is removed.
    pub async fn publish(self, storage: &StorageConfig) -> AppResult<()> {
        let live = storage.media_root.join(&self.tiles.tiles_path);
        let retired = storage
            .media_root
            .join(STAGING_DIR)
            .join(format!("retired-{}", Uuid::new_v4()));

        let had_live = tokio::fs::try_exists(&live).await.map_err(publish_error)?;
        if had_live {
            tokio::fs::rename(&live, &retired)
                .await
                .map_err(publish_error)?;
        } else if let Some(parent) = live.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(publish_error)?;
        }

        if let Err(e) = tokio::fs::rename(&self.dir, &live).await {
            if had_live {
                if let Err(restore) = tokio::fs::rename(&retired, &live).await {
                    tracing::error!(dir = %live.display(), error = %restore, "Failed to restore tiles");
                }
            }
            remove_dir_quietly(&self.dir).await;
            return Err(publish_error(e));
        }

        if had_live {
            remove_dir_quietly(&retired).await;
        }
        Ok(())
    }

    /// Drop the staged pyramid.
    pub async fn discard(self) {
        remove_dir_quietly(&self.dir).await;
    }
}

fn publish_error(err: std::io::Error) -> AppError {
    AppError::InternalError(format!("Failed to publish tiles: {err}"))
}

async fn tile_raster_into(
    state: &AppState,
    file: &UploadedFile,
    uuid: &str,
    output_dir: &Path,
) -> AppResult<TileSet> {
    let tiler = &state.config.tiler;
    let staged = stage_upload(file).await?;

    let info = probe_raster(&tiler.gdalinfo_bin, staged.path())
        .await
        .map_err(|e| match e {
            RasterError::NotFound(_) => AppError::InternalError(e.to_string()),
            other => {
                tracing::info!(file = %file.file_name, error = %other, "Rejected unreadable raster");
                AppError::BadRequest(RASTER_CHECK_FAILED_MSG.to_string())
            }
        })?;

    let srid = info.srid.ok_or_else(|| {
        AppError::BadRequest(
            "The raster has no EPSG coordinate reference system, assign one with gdal".into(),
        )
    })?;
    if !SpatialRefRepo::exists(&state.pool, srid).await? {
        return Err(AppError::BadRequest(format!(
            "The raster uses an unknown spatial reference EPSG:{srid}, reproject it with gdal"
        )));
    }

    check_raster(tiler, staged.path())
        .await
        .map_err(|e| tiling_error(e, RASTER_CHECK_FAILED_MSG))?;

    generate_tiles(tiler, staged.path(), output_dir)
        .await
        .map_err(|e| tiling_error(e, TILING_FAILED_MSG))?;

    tracing::info!(
        uuid,
        srid,
        size = ?info.size,
        bands = ?info.band_types,
        "Raster tiled"
    );

    Ok(TileSet {
        uuid: uuid.to_string(),
        tiles_path: format!("{TILES_DIR}/{uuid}"),
        extent: info.extent,
        srid,
    })
}

fn tiling_error(err: TilingError, user_message: &str) -> AppError {
    match err {
        TilingError::NotFound(_) | TilingError::IoError(_) => {
            AppError::InternalError(err.to_string())
        }
        TilingError::ExecutionFailed { .. } | TilingError::TimedOut(_) => {
            tracing::info!(error = %err, "Tiler rejected raster");
            AppError::BadRequest(user_message.to_string())
        }
    }
}

/// Remove a tile directory given its media-relative path. Failures are logged.
pub async fn remove_tiles(storage: &StorageConfig, tiles_path: &str) {
    remove_dir_quietly(&storage.media_root.join(tiles_path)).await;
}

async fn remove_dir_quietly(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove tiles");
        }
    }
}

/// Validate an uploaded superpixel file and its declared spatial reference.
pub async fn parse_superpixel_file(
    state: &AppState,
    file: &UploadedFile,
) -> AppResult<SuperpixelUpload> {
    let upload = parse_superpixels(&file.data).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if !SpatialRefRepo::exists(&state.pool, upload.source_srid).await? {
        return Err(AppError::BadRequest(format!(
            "Error reading geojson file: unknown spatial reference EPSG:{}",
            upload.source_srid
        )));
    }
    Ok(upload)
}

/// XYZ URL template for a tile directory, e.g. `/media/tiles/<uuid>/{z}/{x}/{y}.png`.
pub fn tile_url_template(storage: &StorageConfig, tiles_path: &str) -> String {
    format!(
        "{}/{}/{{z}}/{{x}}/{{y}}.png",
        storage.media_url,
        tiles_path.trim_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spmc_core::raster::BoundingBox;

    fn storage() -> StorageConfig {
        StorageConfig {
            media_root: PathBuf::from("/srv/media"),
            media_url: "/media".to_string(),
        }
    }

    #[test]
    fn test_tile_url_template() {
        assert_eq!(
            tile_url_template(&storage(), "tiles/abc"),
            "/media/tiles/abc/{z}/{x}/{y}.png"
        );
    }

    #[test]
    fn test_extension_is_lowercased() {
        let file = UploadedFile {
            file_name: "Scene_01.TIF".to_string(),
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(file.extension().as_deref(), Some("tif"));

        let bare = UploadedFile {
            file_name: "scene".to_string(),
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_form_accessors() {
        let mut form = UploadForm::default();
        form.fields.insert("project_id".into(), "12".into());
        form.fields.insert("algo_id".into(), "abc".into());
        form.fields.insert("replace".into(), "On".into());

        assert_eq!(form.required_id("project_id").unwrap(), 12);
        assert!(form.id("algo_id").is_err());
        assert_eq!(form.id("missing").unwrap(), None);
        assert!(form.required_text("name").is_err());
        assert!(form.flag("replace"));
        assert!(!form.flag("missing"));
        assert!(form.required_file("image_file").is_err());
    }

    #[tokio::test]
    async fn test_stage_upload_keeps_extension_and_content() {
        let file = UploadedFile {
            file_name: "scene.tif".to_string(),
            data: Bytes::from_static(b"raster-bytes"),
        };
        let staged = stage_upload(&file).await.unwrap();
        assert_eq!(
            staged.path().extension().and_then(|e| e.to_str()),
            Some("tif")
        );
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"raster-bytes");
    }

    #[tokio::test]
    async fn test_remove_tiles_ignores_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            media_root: root.path().to_path_buf(),
            media_url: "/media".to_string(),
        };
        std::fs::create_dir_all(root.path().join("tiles/u1/10")).unwrap();

        remove_tiles(&storage, "tiles/u1").await;
        assert!(!root.path().join("tiles/u1").exists());

        remove_tiles(&storage, "tiles/never-existed").await;
    }

    fn staged(root: &Path, uuid: &str) -> StagedTiles {
        let dir = root.join(STAGING_DIR).join("run-1");
        std::fs::create_dir_all(dir.join("10/512")).unwrap();
        std::fs::write(dir.join("10/512/384.png"), b"new").unwrap();
        StagedTiles {
            tiles: TileSet {
                uuid: uuid.to_string(),
                tiles_path: format!("{TILES_DIR}/{uuid}"),
                extent: BoundingBox {
                    xmin: 0.0,
                    ymin: 0.0,
                    xmax: 1.0,
                    ymax: 1.0,
                },
                srid: 4326,
            },
            dir,
        }
    }

    #[tokio::test]
    async fn test_publish_replaces_served_tiles() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            media_root: root.path().to_path_buf(),
            media_url: "/media".to_string(),
        };
        let live = root.path().join("tiles/u1");
        std::fs::create_dir_all(live.join("10/512")).unwrap();
        std::fs::write(live.join("10/512/384.png"), b"old").unwrap();
        std::fs::write(live.join("10/512/385.png"), b"old").unwrap();

        let staged = staged(root.path(), "u1");
        let staging_dir = staged.dir.clone();
        staged.publish(&storage).await.unwrap();

        assert_eq!(std::fs::read(live.join("10/512/384.png")).unwrap(), b"new");
        assert!(!live.join("10/512/385.png").exists());
        assert!(!staging_dir.exists());
        assert_eq!(
            std::fs::read_dir(root.path().join(STAGING_DIR)).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_publish_without_previous_tiles() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            media_root: root.path().to_path_buf(),
            media_url: "/media".to_string(),
        };

        staged(root.path(), "fresh").publish(&storage).await.unwrap();

        assert!(root.path().join("tiles/fresh/10/512/384.png").is_file());
    }

    #[tokio::test]
    async fn test_discard_leaves_served_tiles_alone() {
        let root = tempfile::tempdir().unwrap();
        let live = root.path().join("tiles/u1/10");
        std::fs::create_dir_all(&live).unwrap();

        let staged = staged(root.path(), "u1");
        let staging_dir = staged.dir.clone();
        staged.discard().await;

        assert!(!staging_dir.exists());
        assert!(live.is_dir());
    }
}
