//! Raster inspection via `gdalinfo -json`.
//!
//! The raster itself is never decoded in-process: GDAL reports the corner
//! coordinates and coordinate system, from which the extent and SRID are
//! derived here.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Srid;

/// Error type for raster inspection.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("gdalinfo binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("raster could not be read (exit code {exit_code:?}): {stderr}")]
    Unreadable {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse gdalinfo output: {0}")]
    ParseError(String),

    #[error("raster file not found: {0}")]
    FileNotFound(String),
}

/// Axis-aligned extent in the raster's own coordinate system, ordered the
/// way PostGIS `ST_MakeEnvelope` expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Smallest box containing every given `[x, y]` point.
    ///
    /// Returns `None` for an empty slice or non-finite coordinates.
    pub fn from_points(points: &[[f64; 2]]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            xmin: first[0],
            ymin: first[1],
            xmax: first[0],
            ymax: first[1],
        };
        for [x, y] in points.iter().copied() {
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            bbox.xmin = bbox.xmin.min(x);
            bbox.ymin = bbox.ymin.min(y);
            bbox.xmax = bbox.xmax.max(x);
            bbox.ymax = bbox.ymax.max(y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// What the ingestion layer needs to know about an uploaded raster.
#[derive(Debug, Clone, Serialize)]
pub struct RasterInfo {
    /// Pixel dimensions `[width, height]`.
    pub size: [u32; 2],
    pub extent: BoundingBox,
    /// `None` when the raster carries no EPSG-identifiable CRS.
    pub srid: Option<Srid>,
    /// GDAL band data types, e.g. `["Byte", "Byte", "Byte"]`.
    pub band_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// gdalinfo JSON output structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GdalInfoOutput {
    size: [u32; 2],
    #[serde(rename = "coordinateSystem")]
    coordinate_system: Option<GdalCoordinateSystem>,
    #[serde(rename = "cornerCoordinates")]
    corner_coordinates: Option<GdalCorners>,
    #[serde(default)]
    bands: Vec<GdalBand>,
    stac: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GdalCoordinateSystem {
    #[serde(default)]
    wkt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GdalCorners {
    upper_left: [f64; 2],
    lower_left: [f64; 2],
    lower_right: [f64; 2],
    upper_right: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct GdalBand {
    #[serde(rename = "type")]
    data_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `gdalinfo -json` on a raster and summarise the result.
pub async fn probe_raster(gdalinfo_bin: &str, path: &Path) -> Result<RasterInfo, RasterError> {
    if !path.exists() {
        return Err(RasterError::FileNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new(gdalinfo_bin)
        .arg("-json")
        .arg(path)
        .output()
        .await
        .map_err(RasterError::NotFound)?;

    if !output.status.success() {
        return Err(RasterError::Unreadable {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_gdalinfo(&stdout)
}

/// Parse the JSON document printed by `gdalinfo -json`.
pub fn parse_gdalinfo(json: &str) -> Result<RasterInfo, RasterError> {
    let info: GdalInfoOutput =
        serde_json::from_str(json).map_err(|e| RasterError::ParseError(e.to_string()))?;

    let corners = info.corner_coordinates.ok_or_else(|| {
        RasterError::ParseError("raster has no corner coordinates (not georeferenced?)".into())
    })?;
    let extent = BoundingBox::from_points(&[
        corners.upper_left,
        corners.lower_left,
        corners.lower_right,
        corners.upper_right,
    ])
    .ok_or_else(|| RasterError::ParseError("corner coordinates are not finite".into()))?;
    if extent.width() <= 0.0 || extent.height() <= 0.0 {
        return Err(RasterError::ParseError(format!(
            "raster extent has no area ({} x {})",
            extent.width(),
            extent.height()
        )));
    }

    let srid = info
        .stac
        .as_ref()
        .and_then(|stac| stac.get("proj:epsg"))
        .and_then(serde_json::Value::as_i64)
        .and_then(|code| Srid::try_from(code).ok())
        .or_else(|| {
            info.coordinate_system
                .as_ref()
                .and_then(|cs| srid_from_wkt(&cs.wkt))
        });

    let band_types = info
        .bands
        .into_iter()
        .map(|b| b.data_type.unwrap_or_else(|| "Unknown".to_string()))
        .collect();

    Ok(RasterInfo {
        size: info.size,
        extent,
        srid,
        band_types,
    })
}

/// Extract the EPSG code of the top-level CRS from a WKT1 or WKT2 string.
///
/// Only an `ID` / `AUTHORITY` that is a direct child of the root node
/// counts. Ids of nested components (base CRS, datum, method, parameters)
/// say nothing about the CRS itself, so a custom CRS without its own id
/// yields `None`.
pub fn srid_from_wkt(wkt: &str) -> Option<Srid> {
    static EPSG_ID: OnceLock<Regex> = OnceLock::new();
    let re = EPSG_ID.get_or_init(|| {
        Regex::new(r#"\b(?:ID|AUTHORITY)[\[(]\s*"EPSG"\s*,\s*"?(\d+)"?\s*[\])]"#)
            .expect("EPSG id pattern is valid")
    });
    re.captures_iter(wkt)
        .filter(|c| c.get(0).is_some_and(|m| wkt_depth_at(wkt, m.start()) == 1))
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Bracket nesting depth at byte offset `pos`, ignoring quoted text.
fn wkt_depth_at(wkt: &str, pos: usize) -> usize {
    let mut depth = 0usize;
    let mut quoted = false;
    for c in wkt[..pos].chars() {
        match c {
            '"' => quoted = !quoted,
            '[' | '(' if !quoted => depth += 1,
            ']' | ')' if !quoted => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}
