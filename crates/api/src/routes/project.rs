//! Read-only project and scene routes for any authenticated user.

use axum::routing::get;
use axum::Router;

use crate::handlers::{project, scene};
use crate::state::AppState;

/// Routes mounted at the `/api/v1` root.
///
/// ```text
/// GET /projects                       -> list
/// GET /projects/{id}                  -> get_by_id
/// GET /projects/{id}/scenes           -> list_scenes
/// GET /projects/{id}/algorithms       -> list_algorithms (approved)
/// GET /projects/{id}/land-classes     -> list_land_classes (approved)
/// GET /scenes/{id}                    -> scene::get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(project::list))
        .route("/projects/{id}", get(project::get_by_id))
        .route("/projects/{id}/scenes", get(project::list_scenes))
        .route("/projects/{id}/algorithms", get(project::list_algorithms))
        .route("/projects/{id}/land-classes", get(project::list_land_classes))
        .route("/scenes/{id}", get(scene::get_by_id))
}
