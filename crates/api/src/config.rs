use std::path::PathBuf;
use std::time::Duration;

use spmc_core::tiling::TilerConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`, uploads include tiling).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 512 MiB).
    pub max_upload_bytes: usize,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub tiler: TilerConfig,
}

/// Where generated tiles live on disk and how clients address them.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Filesystem root for `tiles/<uuid>/...` (default: `./media`).
    pub media_root: PathBuf,
    /// URL prefix the media root is served under (default: `/media`).
    pub media_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `MAX_UPLOAD_BYTES`     | `536870912`                |
    ///
    /// See [`StorageConfig::from_env`], [`tiler_from_env`] and
    /// [`jwt_from_env`] for the remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (512 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            jwt: jwt_from_env(),
            storage: StorageConfig::from_env(),
            tiler: tiler_from_env(),
        }
    }
}

impl StorageConfig {
    /// | Env Var      | Default   |
    /// |--------------|-----------|
    /// | `MEDIA_ROOT` | `./media` |
    /// | `MEDIA_URL`  | `/media`  |
    pub fn from_env() -> Self {
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));
        let media_url = std::env::var("MEDIA_URL")
            .unwrap_or_else(|_| "/media".into())
            .trim_end_matches('/')
            .to_string();
        Self {
            media_root,
            media_url,
        }
    }
}

/// Load the external raster tool settings.
///
/// | Env Var              | Default         |
/// |----------------------|-----------------|
/// | `TILER_BIN`          | `gdal2tiles.py` |
/// | `GDALINFO_BIN`       | `gdalinfo`      |
/// | `TILE_ZOOM`          | `10-18`         |
/// | `TILE_RESAMPLING`    | `bilinear`      |
/// | `TILER_TIMEOUT_SECS` | `600`           |
pub fn tiler_from_env() -> TilerConfig {
    let defaults = TilerConfig::default();

    let timeout_secs: u64 = std::env::var("TILER_TIMEOUT_SECS")
        .map(|v| v.parse().expect("TILER_TIMEOUT_SECS must be a valid u64"))
        .unwrap_or(defaults.timeout.as_secs());

    TilerConfig {
        tiler_bin: std::env::var("TILER_BIN").unwrap_or(defaults.tiler_bin),
        gdalinfo_bin: std::env::var("GDALINFO_BIN").unwrap_or(defaults.gdalinfo_bin),
        zoom_levels: std::env::var("TILE_ZOOM").unwrap_or(defaults.zoom_levels),
        resampling: std::env::var("TILE_RESAMPLING").unwrap_or(defaults.resampling),
        timeout: Duration::from_secs(timeout_secs),
    }
}

/// Load token settings.
///
/// | Env Var                   | Default      |
/// |---------------------------|--------------|
/// | `JWT_SECRET`              | *(required)* |
/// | `JWT_ACCESS_EXPIRY_MINS`  | `60`         |
/// | `JWT_REFRESH_EXPIRY_DAYS` | `7`          |
pub fn jwt_from_env() -> JwtConfig {
    let secret = std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .expect("JWT_SECRET must be set to a non-empty value");

    let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
        .map(|v| v.parse().expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64"))
        .unwrap_or(60);

    let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
        .map(|v| v.parse().expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64"))
        .unwrap_or(7);

    JwtConfig {
        secret,
        access_token_expiry_mins,
        refresh_token_expiry_days,
    }
}
