//! Route definitions for the `/navigation` wizard.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::navigation;
use crate::state::AppState;

/// Routes mounted at `/navigation`.
///
/// ```text
/// GET  /                -> get_state
/// POST /project         -> select_project
/// GET  /scenes          -> list_scenes
/// POST /scene           -> select_scene
/// POST /algorithm       -> select_algorithm
/// GET  /classification  -> classification_context
/// POST /reset           -> reset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(navigation::get_state))
        .route("/project", post(navigation::select_project))
        .route("/scenes", get(navigation::list_scenes))
        .route("/scene", post(navigation::select_scene))
        .route("/algorithm", post(navigation::select_algorithm))
        .route("/classification", get(navigation::classification_context))
        .route("/reset", post(navigation::reset))
}
