//! `/auth`: `POST /login` and `POST /refresh` are public, `POST /logout`
//! needs a bearer token.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth::{login, logout, refresh};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}
