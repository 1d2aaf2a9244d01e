//! Validation of uploaded superpixel GeoJSON.
//!
//! Structural checks happen here; reprojection and the containment test
//! against the scene bounding box run in PostGIS at import time.

use std::sync::OnceLock;

use geojson::{FeatureCollection, GeoJson, Geometry, Value};
use regex::Regex;

use crate::types::{Srid, STORAGE_SRID};

pub const ONLY_POLYGONS_MSG: &str = "GeoJSON file must contain only Polygon features.";

pub const OUTSIDE_BBOX_MSG: &str = "Some of provided polygons are outside the scene bounding box";

/// Error type for superpixel uploads. All variants are user-facing.
#[derive(Debug, thiserror::Error)]
pub enum SuperpixelError {
    #[error("Error reading geojson file: {0}")]
    Malformed(String),

    #[error("Error reading geojson file: expected a FeatureCollection")]
    NotFeatureCollection,

    #[error("Error reading geojson file: the FeatureCollection has no features")]
    Empty,

    #[error("{}", ONLY_POLYGONS_MSG)]
    NotPolygon { feature_index: usize },

    #[error("Error reading geojson file: feature {feature_index} has an invalid ring ({reason})")]
    InvalidRing {
        feature_index: usize,
        reason: &'static str,
    },

    #[error("Error reading geojson file: unsupported crs '{0}'")]
    UnsupportedCrs(String),
}

/// A validated upload, ready for insertion.
#[derive(Debug, Clone)]
pub struct SuperpixelUpload {
    /// SRID the coordinates are expressed in.
    pub source_srid: Srid,
    /// One serialized GeoJSON Polygon geometry per feature, in file order.
    pub polygons: Vec<String>,
}

/// Parse and validate an uploaded superpixel file.
pub fn parse_superpixels(bytes: &[u8]) -> Result<SuperpixelUpload, SuperpixelError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SuperpixelError::Malformed(format!("not UTF-8: {e}")))?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| SuperpixelError::Malformed(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(SuperpixelError::NotFeatureCollection),
    };
    if collection.features.is_empty() {
        return Err(SuperpixelError::Empty);
    }

    let source_srid = collection_srid(&collection)?;

    let mut polygons = Vec::with_capacity(collection.features.len());
    for (feature_index, feature) in collection.features.iter().enumerate() {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or(SuperpixelError::NotPolygon { feature_index })?;
        validate_polygon(feature_index, geometry)?;
        let serialized = serde_json::to_string(&Geometry::new(geometry.value.clone()))
            .map_err(|e| SuperpixelError::Malformed(e.to_string()))?;
        polygons.push(serialized);
    }

    Ok(SuperpixelUpload {
        source_srid,
        polygons,
    })
}

fn validate_polygon(feature_index: usize, geometry: &Geometry) -> Result<(), SuperpixelError> {
    let Value::Polygon(rings) = &geometry.value else {
        return Err(SuperpixelError::NotPolygon { feature_index });
    };
    if rings.is_empty() {
        return Err(SuperpixelError::InvalidRing {
            feature_index,
            reason: "polygon has no rings",
        });
    }
    for ring in rings {
        if ring.len() < 4 {
            return Err(SuperpixelError::InvalidRing {
                feature_index,
                reason: "ring has fewer than 4 positions",
            });
        }
        if ring.iter().any(|p| p.len() < 2 || p.iter().any(|c| !c.is_finite())) {
            return Err(SuperpixelError::InvalidRing {
                feature_index,
                reason: "position is not a finite coordinate pair",
            });
        }
        if ring.first() != ring.last() {
            return Err(SuperpixelError::InvalidRing {
                feature_index,
                reason: "ring is not closed",
            });
        }
    }
    Ok(())
}

/// SRID declared by the legacy `crs` member, defaulting to WGS 84.
fn collection_srid(collection: &FeatureCollection) -> Result<Srid, SuperpixelError> {
    let name = collection
        .foreign_members
        .as_ref()
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(serde_json::Value::as_str);

    match name {
        None => Ok(STORAGE_SRID),
        Some(name) => srid_from_crs_name(name)
            .ok_or_else(|| SuperpixelError::UnsupportedCrs(name.to_string())),
    }
}

/// Resolve a GeoJSON named CRS (`EPSG:32633`, `urn:ogc:def:crs:EPSG::32633`,
/// `urn:ogc:def:crs:OGC:1.3:CRS84`) to an SRID.
pub fn srid_from_crs_name(name: &str) -> Option<Srid> {
    static EPSG_NAME: OnceLock<Regex> = OnceLock::new();
    if name.ends_with("CRS84") {
        return Some(STORAGE_SRID);
    }
    let re = EPSG_NAME.get_or_init(|| {
        Regex::new(r"(?i)EPSG:(?:[\d.]*:)?(\d+)$").expect("EPSG name pattern is valid")
    });
    re.captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    fn collection(features: &[&str], crs: Option<&str>) -> String {
        let features: Vec<String> = features
            .iter()
            .map(|g| format!(r#"{{"type":"Feature","properties":{{}},"geometry":{g}}}"#))
            .collect();
        let crs = crs
            .map(|n| format!(r#","crs":{{"type":"name","properties":{{"name":"{n}"}}}}"#))
            .unwrap_or_default();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]{crs}}}"#,
            features.join(",")
        )
    }

    #[test]
    fn test_valid_collection_defaults_to_wgs84() {
        let upload = parse_superpixels(collection(&[SQUARE, SQUARE], None).as_bytes()).unwrap();
        assert_eq!(upload.source_srid, 4326);
        assert_eq!(upload.polygons.len(), 2);
        let geom: serde_json::Value = serde_json::from_str(&upload.polygons[0]).unwrap();
        assert_eq!(geom["type"], "Polygon");
    }

    #[test]
    fn test_crs_member_sets_source_srid() {
        let upload = parse_superpixels(
            collection(&[SQUARE], Some("urn:ogc:def:crs:EPSG::32633")).as_bytes(),
        )
        .unwrap();
        assert_eq!(upload.source_srid, 32633);
    }

    #[test]
    fn test_multipolygon_rejected() {
        let multi = r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,0]]]]}"#;
        let err = parse_superpixels(collection(&[SQUARE, multi], None).as_bytes()).unwrap_err();
        assert_matches!(&err, SuperpixelError::NotPolygon { feature_index: 1 });
        assert_eq!(err.to_string(), ONLY_POLYGONS_MSG);
    }

    #[test]
    fn test_feature_without_geometry_rejected() {
        let json = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":null,"geometry":null}]}"#;
        assert_matches!(
            parse_superpixels(json.as_bytes()),
            Err(SuperpixelError::NotPolygon { feature_index: 0 })
        );
    }

    #[test]
    fn test_open_ring_rejected() {
        let open = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1]]]}"#;
        assert_matches!(
            parse_superpixels(collection(&[open], None).as_bytes()),
            Err(SuperpixelError::InvalidRing {
                reason: "ring is not closed",
                ..
            })
        );
    }

    #[test]
    fn test_short_ring_rejected() {
        let short = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[0,0]]]}"#;
        assert_matches!(
            parse_superpixels(collection(&[short], None).as_bytes()),
            Err(SuperpixelError::InvalidRing { .. })
        );
    }

    #[test]
    fn test_bare_geometry_rejected() {
        assert_matches!(
            parse_superpixels(SQUARE.as_bytes()),
            Err(SuperpixelError::NotFeatureCollection)
        );
    }

    #[test]
    fn test_empty_collection_rejected() {
        assert_matches!(
            parse_superpixels(collection(&[], None).as_bytes()),
            Err(SuperpixelError::Empty)
        );
    }

    #[test]
    fn test_malformed_and_non_utf8() {
        assert_matches!(
            parse_superpixels(b"{not json"),
            Err(SuperpixelError::Malformed(_))
        );
        assert_matches!(
            parse_superpixels(&[0xff, 0xfe, 0x00]),
            Err(SuperpixelError::Malformed(_))
        );
    }

    #[test]
    fn test_unsupported_crs() {
        assert_matches!(
            parse_superpixels(collection(&[SQUARE], Some("LOCAL:site-grid")).as_bytes()),
            Err(SuperpixelError::UnsupportedCrs(_))
        );
    }

    #[test]
    fn test_crs_name_variants() {
        assert_eq!(srid_from_crs_name("EPSG:3857"), Some(3857));
        assert_eq!(srid_from_crs_name("urn:ogc:def:crs:EPSG::2154"), Some(2154));
        assert_eq!(srid_from_crs_name("urn:ogc:def:crs:EPSG:6.6:4326"), Some(4326));
        assert_eq!(srid_from_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(4326));
        assert_eq!(srid_from_crs_name("epsg:32633"), Some(32633));
        assert_eq!(srid_from_crs_name("WGS84"), None);
    }
}
