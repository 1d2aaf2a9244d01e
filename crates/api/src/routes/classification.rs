//! Route definitions for `/classification`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::classification;
use crate::state::AppState;

/// Routes mounted at `/classification`.
///
/// ```text
/// GET    /superpixels     -> superpixels (GeoJSON)
/// GET    /entries         -> list_entries
/// PUT    /entries         -> save_entries (batch upsert)
/// POST   /entries/one     -> save_entry
/// DELETE /entries/{id}    -> delete_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/superpixels", get(classification::superpixels))
        .route(
            "/entries",
            get(classification::list_entries).put(classification::save_entries),
        )
        .route("/entries/one", post(classification::save_entry))
        .route("/entries/{id}", delete(classification::delete_entry))
}
