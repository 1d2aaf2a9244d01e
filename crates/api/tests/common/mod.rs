#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use spmc_api::auth::jwt::{issue_access_token, JwtConfig};
use spmc_api::auth::password::hash_password;
use spmc_api::config::{ServerConfig, StorageConfig};
use spmc_api::router::build_app_router;
use spmc_api::state::AppState;
use spmc_core::raster::BoundingBox;
use spmc_core::roles::Role;
use spmc_core::tiling::TilerConfig;
use spmc_core::types::DbId;
use spmc_core::superpixels::SuperpixelUpload;
use spmc_db::models::algorithm::CreateAlgorithm;
use spmc_db::models::land_class::CreateLandClass;
use spmc_db::models::project::CreateProject;
use spmc_db::models::scene::{CreateScene, TileSet};
use spmc_db::models::user::{CreateUser, User};
use spmc_db::repositories::{
    AlgorithmRepo, LandClassRepo, LandClassificationRepo, ProjectAlgoRepo, ProjectRepo, SceneRepo,
    UserRepo,
};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Directory holding a stand-in `gdalinfo` that prints the uploaded file.
///
/// Tests upload a `gdalinfo -json` document as the "raster", so probing
/// works without GDAL installed. The tiler is `true`, which succeeds and
/// leaves the freshly created output directory empty.
fn fake_tools() -> &'static Path {
    static TOOLS: OnceLock<TempDir> = OnceLock::new();
    TOOLS
        .get_or_init(|| {
            let dir = tempfile::tempdir().unwrap();
            let script = dir.path().join("gdalinfo");
            std::fs::write(&script, "#!/bin/sh\n[ \"$1\" = \"-json\" ] || exit 2\ncat \"$2\"\n")
                .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            dir
        })
        .path()
}

/// Build a test `ServerConfig` rooted at `media_root`.
pub fn test_config_with_media(media_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 8 * 1024 * 1024,
        jwt: JwtConfig {
            secret: "spmc-integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 1,
        },
        storage: StorageConfig {
            media_root: media_root.to_path_buf(),
            media_url: "/media".to_string(),
        },
        tiler: TilerConfig {
            tiler_bin: "true".to_string(),
            gdalinfo_bin: fake_tools().join("gdalinfo").to_string_lossy().to_string(),
            timeout: Duration::from_secs(10),
            ..TilerConfig::default()
        },
    }
}

pub fn test_config() -> ServerConfig {
    test_config_with_media(&std::env::temp_dir().join("spmc-test-media"))
}

/// Build the full application router, middleware included, for `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app(pool, test_config())
}

pub fn build_test_app_with_media(pool: PgPool, media_root: &Path) -> Router {
    build_app(pool, test_config_with_media(media_root))
}

fn build_app(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role,
        },
    )
    .await
    .unwrap()
}

/// Mint an access token directly, skipping the login round trip.
pub fn token_for(user_id: DbId, role: Role) -> String {
    issue_access_token(user_id, role, &test_config().jwt).unwrap()
}

pub async fn admin_token(pool: &PgPool) -> String {
    let user = create_user(pool, "root", Role::Admin).await;
    token_for(user.id, Role::Admin)
}

pub async fn classifier(pool: &PgPool, username: &str) -> (User, String) {
    let user = create_user(pool, username, Role::Classifier).await;
    let token = token_for(user.id, Role::Classifier);
    (user, token)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// `gdalinfo -json` output for a 1°×1° WGS 84 raster at 10..11 E, 45..46 N.
pub fn wgs84_raster() -> Vec<u8> {
    wgs84_raster_at(10.0, 45.0)
}

/// A 1°×1° WGS 84 raster whose lower-left corner is at `(x, y)`.
pub fn wgs84_raster_at(x: f64, y: f64) -> Vec<u8> {
    serde_json::json!({
        "size": [256, 256],
        "coordinateSystem": { "wkt": "GEOGCS[\"WGS 84\",AUTHORITY[\"EPSG\",\"4326\"]]" },
        "cornerCoordinates": {
            "upperLeft": [x, y + 1.0],
            "lowerLeft": [x, y],
            "lowerRight": [x + 1.0, y],
            "upperRight": [x + 1.0, y + 1.0]
        },
        "bands": [{ "band": 1, "type": "Byte" }, { "band": 2, "type": "Byte" }, { "band": 3, "type": "Byte" }]
    })
    .to_string()
    .into_bytes()
}

/// A raster tagged with an EPSG code PostGIS does not know.
pub fn unknown_epsg_raster() -> Vec<u8> {
    serde_json::json!({
        "size": [256, 256],
        "stac": { "proj:epsg": 990_001 },
        "cornerCoordinates": {
            "upperLeft": [0.0, 256.0],
            "lowerLeft": [0.0, 0.0],
            "lowerRight": [256.0, 0.0],
            "upperRight": [256.0, 256.0]
        },
        "bands": [{ "band": 1, "type": "Byte" }]
    })
    .to_string()
    .into_bytes()
}

/// Same raster without any coordinate system.
pub fn unreferenced_raster() -> Vec<u8> {
    serde_json::json!({
        "size": [256, 256],
        "cornerCoordinates": {
            "upperLeft": [0.0, 256.0],
            "lowerLeft": [0.0, 0.0],
            "lowerRight": [256.0, 0.0],
            "upperRight": [256.0, 256.0]
        },
        "bands": [{ "band": 1, "type": "Byte" }]
    })
    .to_string()
    .into_bytes()
}

/// The extent of [`wgs84_raster`] as a stored tile set.
pub fn wgs84_tiles(uuid: &str) -> TileSet {
    TileSet {
        uuid: uuid.to_string(),
        tiles_path: format!("tiles/{uuid}"),
        extent: BoundingBox {
            xmin: 10.0,
            ymin: 45.0,
            xmax: 11.0,
            ymax: 46.0,
        },
        srid: 4326,
    }
}

pub fn square(x: f64, y: f64, size: f64) -> String {
    format!(
        r#"{{"type":"Polygon","coordinates":[[[{x},{y}],[{x2},{y}],[{x2},{y2}],[{x},{y2}],[{x},{y}]]]}}"#,
        x2 = x + size,
        y2 = y + size,
    )
}

pub fn feature_collection(geometries: &[String]) -> Vec<u8> {
    let features: Vec<String> = geometries
        .iter()
        .map(|g| format!(r#"{{"type":"Feature","properties":{{}},"geometry":{g}}}"#))
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
    .into_bytes()
}

/// A project with one tiled scene and two superpixels, ready to classify.
pub struct World {
    pub project_id: DbId,
    pub scene_id: DbId,
    pub algo_id: DbId,
    /// Approved for the project.
    pub forest_id: DbId,
    /// Exists but is not approved for the project.
    pub water_id: DbId,
    pub superpixel_ids: Vec<DbId>,
}

/// Seed a [`World`] directly through the repositories.
///
/// The project displays in EPSG:4326 so returned geometries keep the
/// uploaded coordinates.
pub async fn seed_world(pool: &PgPool) -> World {
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            name: "Alps".to_string(),
            description: None,
            srid: Some(4326),
        },
    )
    .await
    .unwrap();
    let algo = AlgorithmRepo::create(
        pool,
        &CreateAlgorithm {
            name: "slic".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    ProjectAlgoRepo::approve(pool, project.id, algo.id).await.unwrap();

    let forest = LandClassRepo::create(
        pool,
        &CreateLandClass {
            name: "Forest".to_string(),
            color: "#00aa00".to_string(),
        },
    )
    .await
    .unwrap();
    let water = LandClassRepo::create(
        pool,
        &CreateLandClass {
            name: "Water".to_string(),
            color: "#0000ff".to_string(),
        },
    )
    .await
    .unwrap();
    LandClassificationRepo::approve(pool, project.id, forest.id)
        .await
        .unwrap();

    let upload = SuperpixelUpload {
        source_srid: 4326,
        polygons: vec![square(10.1, 45.1, 0.2), square(10.5, 45.5, 0.2)],
    };
    let (scene, _) = SceneRepo::create(
        pool,
        &CreateScene {
            project_id: project.id,
            name: "scene-1".to_string(),
            description: None,
        },
        &wgs84_tiles("3f1c8a52-0000-4000-8000-000000000001"),
        Some((algo.id, &upload)),
    )
    .await
    .unwrap();

    let superpixel_ids: Vec<DbId> =
        sqlx::query_scalar("SELECT id FROM superpixels WHERE scene_id = $1 ORDER BY id")
            .bind(scene.id)
            .fetch_all(pool)
            .await
            .unwrap();

    World {
        project_id: project.id,
        scene_id: scene.id,
        algo_id: algo.id,
        forest_id: forest.id,
        water_id: water.id,
        superpixel_ids,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, json_request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::GET, uri, None, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(body), None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(body), Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(body), Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, json_request(Method::DELETE, uri, None, Some(token))).await
}

/// One part of a multipart form.
pub enum Part {
    Text(&'static str, String),
    File(&'static str, &'static str, Vec<u8>),
}

const BOUNDARY: &str = "spmc-test-boundary-7MA4YWxkTrZu0gW";

pub fn multipart_body(parts: Vec<Part>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn multipart_auth(
    app: Router,
    method: Method,
    uri: &str,
    parts: Vec<Part>,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

/// Absolute path of a scene's tile directory under `media_root`.
pub fn tiles_on_disk(media_root: &Path, tiles_path: &str) -> PathBuf {
    media_root.join(tiles_path)
}
