//! Route definitions for the `/admin` tree.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{admin, algorithm, land_class, misc_tile, project, scene};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /users                                   -> list_users
/// POST   /users                                   -> create_user
/// GET    /users/{id}                              -> get_user
/// PUT    /users/{id}                              -> update_user
/// DELETE /users/{id}                              -> deactivate_user
/// POST   /users/{id}/reset-password               -> reset_password
///
/// GET    /projects                                -> project::list
/// POST   /projects                                -> project::create
/// GET    /projects/{id}                           -> project::get_by_id
/// PUT    /projects/{id}                           -> project::update
/// DELETE /projects/{id}                           -> project::delete
/// GET    /projects/{id}/algorithms                -> project::list_algorithms
/// POST   /projects/{id}/algorithms                -> project::approve_algorithm
/// DELETE /projects/{id}/algorithms/{algo_id}      -> project::revoke_algorithm
/// GET    /projects/{id}/land-classes              -> project::list_land_classes
/// POST   /projects/{id}/land-classes              -> project::approve_land_class
/// DELETE /projects/{id}/land-classes/{class_id}   -> project::revoke_land_class
///
/// GET    /algorithms                              -> algorithm::list
/// POST   /algorithms                              -> algorithm::create
/// GET    /algorithms/{id}                         -> algorithm::get_by_id
/// PUT    /algorithms/{id}                         -> algorithm::update
/// DELETE /algorithms/{id}                         -> algorithm::delete
///
/// GET    /land-classes                            -> land_class::list
/// POST   /land-classes                            -> land_class::create
/// GET    /land-classes/{id}                       -> land_class::get_by_id
/// PUT    /land-classes/{id}                       -> land_class::update
/// DELETE /land-classes/{id}                       -> land_class::delete
///
/// POST   /scenes                                  -> scene::create (multipart)
/// PUT    /scenes/{id}                             -> scene::update (multipart)
/// DELETE /scenes/{id}                             -> scene::delete
/// POST   /scenes/{id}/superpixels                 -> scene::import_superpixels (multipart)
/// GET    /scenes/{scene_id}/misc-tiles            -> misc_tile::list_by_scene
/// POST   /scenes/{scene_id}/misc-tiles            -> misc_tile::create (multipart)
/// GET    /misc-tiles/{id}                         -> misc_tile::get_by_id
/// PUT    /misc-tiles/{id}                         -> misc_tile::update (multipart)
/// DELETE /misc-tiles/{id}                         -> misc_tile::delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::deactivate_user),
        )
        .route("/users/{id}/reset-password", post(admin::reset_password))
        .route("/projects", get(project::list).post(project::create))
        .route(
            "/projects/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route(
            "/projects/{id}/algorithms",
            get(project::list_algorithms).post(project::approve_algorithm),
        )
        .route(
            "/projects/{id}/algorithms/{algo_id}",
            delete(project::revoke_algorithm),
        )
        .route(
            "/projects/{id}/land-classes",
            get(project::list_land_classes).post(project::approve_land_class),
        )
        .route(
            "/projects/{id}/land-classes/{land_class_id}",
            delete(project::revoke_land_class),
        )
        .route("/algorithms", get(algorithm::list).post(algorithm::create))
        .route(
            "/algorithms/{id}",
            get(algorithm::get_by_id)
                .put(algorithm::update)
                .delete(algorithm::delete),
        )
        .route(
            "/land-classes",
            get(land_class::list).post(land_class::create),
        )
        .route(
            "/land-classes/{id}",
            get(land_class::get_by_id)
                .put(land_class::update)
                .delete(land_class::delete),
        )
        .route("/scenes", post(scene::create))
        .route("/scenes/{id}", put(scene::update).delete(scene::delete))
        .route("/scenes/{id}/superpixels", post(scene::import_superpixels))
        .route(
            "/scenes/{id}/misc-tiles",
            get(misc_tile::list_by_scene).post(misc_tile::create),
        )
        .route(
            "/misc-tiles/{id}",
            get(misc_tile::get_by_id)
                .put(misc_tile::update)
                .delete(misc_tile::delete),
        )
}
