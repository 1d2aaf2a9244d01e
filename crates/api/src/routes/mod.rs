pub mod admin;
pub mod auth;
pub mod classification;
pub mod health;
pub mod navigation;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                                   login (public)
/// /auth/refresh                                 refresh (public)
/// /auth/logout                                  logout (requires auth)
///
/// /admin/users[/{id}[/reset-password]]          user management (admin)
/// /admin/projects[/{id}]                        project CRUD (admin)
/// /admin/projects/{id}/algorithms[/{algo_id}]   approve, revoke
/// /admin/projects/{id}/land-classes[/{lc_id}]   approve, revoke
/// /admin/algorithms[/{id}]                      algorithm CRUD
/// /admin/land-classes[/{id}]                    land class CRUD
/// /admin/scenes[/{id}]                          raster upload, re-tile, delete
/// /admin/scenes/{id}/superpixels                GeoJSON import
/// /admin/scenes/{id}/misc-tiles                 list, upload
/// /admin/misc-tiles/{id}                        get, update, delete
///
/// /projects[/{id}]                              list, get (auth)
/// /projects/{id}/scenes                         scenes of a project
/// /projects/{id}/algorithms                     approved algorithms
/// /projects/{id}/land-classes                   approved land classes
/// /scenes/{id}                                  scene detail with misc tiles
///
/// /navigation                                   wizard state (auth)
/// /navigation/{project,scene,algorithm}         select a step (POST)
/// /navigation/scenes                            scenes of the selection
/// /navigation/classification                    classification context
/// /navigation/reset                             clear the selection (POST)
///
/// /classification/superpixels                   GeoJSON for the map (auth)
/// /classification/entries[/one|/{id}]           caller's entries
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/navigation", navigation::router())
        .nest("/classification", classification::router())
        .merge(project::router())
}
