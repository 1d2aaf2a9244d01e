//! Liveness probe, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub media_root_present: bool,
}

/// `200` with `"ok"` when PostgreSQL answers and the media root exists,
/// otherwise `503` with `"degraded"`.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    let db_healthy = match spmc_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            false
        }
    };
    let media_root_present = tokio::fs::metadata(&state.config.storage.media_root)
        .await
        .is_ok_and(|m| m.is_dir());

    let healthy = db_healthy && media_root_present;
    let body = Health {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        media_root_present,
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
