//! Map tile generation by shelling out to `gdal2tiles.py`.
//!
//! Every function here owns its output directory: on failure the directory
//! is removed so a half-written tile pyramid is never served.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Message shown when a raster cannot be tiled during validation.
pub const RASTER_CHECK_FAILED_MSG: &str = "Problem with raster. The raster should be of a Byte \
     type, check it. Or simply convert the file into some RGB representation with gdal";

/// Message shown when tiling fails for an already-validated upload.
pub const TILING_FAILED_MSG: &str = "Something wrong with the file provided";

/// Sub-directory of the media root holding all tile pyramids.
pub const TILES_DIR: &str = "tiles";

/// Error type for tiling operations.
#[derive(Debug, thiserror::Error)]
pub enum TilingError {
    #[error("tiler binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("tiler failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("tiler timed out after {0:?}")]
    TimedOut(Duration),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// How to invoke the external raster tools.
#[derive(Debug, Clone)]
pub struct TilerConfig {
    /// Tiling executable (default `gdal2tiles.py`).
    pub tiler_bin: String,
    /// Raster inspector executable (default `gdalinfo`).
    pub gdalinfo_bin: String,
    /// Zoom range passed to `-z`, e.g. `"10-18"`.
    pub zoom_levels: String,
    /// Resampling method passed to `-r`.
    pub resampling: String,
    /// Upper bound on a single tiler run.
    pub timeout: Duration,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            tiler_bin: "gdal2tiles.py".to_string(),
            gdalinfo_bin: "gdalinfo".to_string(),
            zoom_levels: "10-18".to_string(),
            resampling: "bilinear".to_string(),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Directory for the tile pyramid identified by `uuid`.
pub fn tiles_dir(media_root: &Path, uuid: &str) -> PathBuf {
    media_root.join(TILES_DIR).join(uuid)
}

/// Create `dir`, wiping it first if it already exists.
pub async fn prepare_output_dir(dir: &Path) -> Result<(), TilingError> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Arguments for a full tiling run.
pub fn tile_args(config: &TilerConfig, input: &Path, output_dir: &Path) -> Vec<String> {
    vec![
        "-z".to_string(),
        config.zoom_levels.clone(),
        "-w".to_string(),
        "none".to_string(),
        "-r".to_string(),
        config.resampling.clone(),
        input.to_string_lossy().to_string(),
        output_dir.to_string_lossy().to_string(),
    ]
}

/// Arguments for the single-zoom validation run.
pub fn check_args(input: &Path, output_dir: &Path) -> Vec<String> {
    vec![
        "-z".to_string(),
        "1".to_string(),
        "-w".to_string(),
        "none".to_string(),
        input.to_string_lossy().to_string(),
        output_dir.to_string_lossy().to_string(),
    ]
}

/// Tile `input` into `output_dir`, recreating the directory first.
///
/// On any failure the output directory is removed before returning.
pub async fn generate_tiles(
    config: &TilerConfig,
    input: &Path,
    output_dir: &Path,
) -> Result<(), TilingError> {
    prepare_output_dir(output_dir).await?;

    let args = tile_args(config, input, output_dir);
    let result = run_tiler(&config.tiler_bin, &args, config.timeout).await;

    if let Err(e) = &result {
        tracing::warn!(
            output_dir = %output_dir.display(),
            error = %e,
            "Tiling failed, removing output directory"
        );
        remove_dir_quietly(output_dir).await;
    }
    result
}

/// Dry-run the tiler at zoom 1 to catch rasters it cannot handle.
///
/// The scratch directory is always removed.
pub async fn check_raster(config: &TilerConfig, input: &Path) -> Result<(), TilingError> {
    let scratch = std::env::temp_dir().join(format!("spmc-check-{}", uuid::Uuid::new_v4()));
    prepare_output_dir(&scratch).await?;

    let args = check_args(input, &scratch);
    let result = run_tiler(&config.tiler_bin, &args, config.timeout).await;

    remove_dir_quietly(&scratch).await;
    result
}

async fn run_tiler(bin: &str, args: &[String], timeout: Duration) -> Result<(), TilingError> {
    tracing::debug!(bin, ?args, "Running tiler");

    let child = tokio::process::Command::new(bin)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(TilingError::NotFound)?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| TilingError::TimedOut(timeout))??;

    if !output.status.success() {
        return Err(TilingError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

async fn remove_dir_quietly(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config_with_bin(bin: &str) -> TilerConfig {
        TilerConfig {
            tiler_bin: bin.to_string(),
            timeout: Duration::from_secs(10),
            ..TilerConfig::default()
        }
    }

    #[test]
    fn test_tile_args_order() {
        let config = TilerConfig::default();
        let args = tile_args(&config, Path::new("/tmp/in.tif"), Path::new("/media/tiles/abc"));
        assert_eq!(
            args,
            vec!["-z", "10-18", "-w", "none", "-r", "bilinear", "/tmp/in.tif", "/media/tiles/abc"]
        );
    }

    #[test]
    fn test_check_args_use_single_zoom() {
        let args = check_args(Path::new("in.tif"), Path::new("out"));
        assert_eq!(args, vec!["-z", "1", "-w", "none", "in.tif", "out"]);
    }

    #[test]
    fn test_tiles_dir_layout() {
        let dir = tiles_dir(Path::new("/srv/media"), "1234");
        assert_eq!(dir, PathBuf::from("/srv/media/tiles/1234"));
    }

    #[tokio::test]
    async fn test_prepare_output_dir_wipes_existing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("tiles");
        std::fs::create_dir_all(dir.join("10")).unwrap();
        std::fs::write(dir.join("10/stale.png"), b"old").unwrap();

        prepare_output_dir(&dir).await.unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generate_tiles_success_keeps_dir() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("ok");
        generate_tiles(&config_with_bin("true"), Path::new("in.tif"), &out)
            .await
            .unwrap();
        assert!(out.is_dir());
    }

    #[tokio::test]
    async fn test_generate_tiles_failure_removes_dir() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("bad");
        let result = generate_tiles(&config_with_bin("false"), Path::new("in.tif"), &out).await;
        assert_matches!(result, Err(TilingError::ExecutionFailed { .. }));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("none");
        let result = generate_tiles(
            &config_with_bin("/nonexistent/gdal2tiles.py"),
            Path::new("in.tif"),
            &out,
        )
        .await;
        assert_matches!(result, Err(TilingError::NotFound(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_check_raster_propagates_failure() {
        let result = check_raster(&config_with_bin("false"), Path::new("in.tif")).await;
        assert_matches!(result, Err(TilingError::ExecutionFailed { .. }));
    }
}
