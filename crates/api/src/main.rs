use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use spmc_api::bootstrap::{ensure_admin, BootstrapAdmin};
use spmc_api::config::ServerConfig;
use spmc_api::router::build_app_router;
use spmc_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "spmc_api=debug,spmc_db=info,spmc_core=debug,tower_http=info";

/// Human-readable logs by default, one JSON object per line with
/// `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json" | "JSON"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        media_root = %config.storage.media_root.display(),
        tiler = %config.tiler.tiler_bin,
        gdalinfo = %config.tiler.gdalinfo_bin,
        "Configuration loaded"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = spmc_db::create_pool(&database_url)
        .await
        .expect("Could not connect to PostgreSQL");
    spmc_db::run_migrations(&pool)
        .await
        .expect("Could not apply migrations");
    tracing::info!("Database ready");

    if let Some(admin) = BootstrapAdmin::from_env() {
        match ensure_admin(&pool, &admin).await {
            Ok(Some(user_id)) => tracing::info!(user_id, "Bootstrap admin account created"),
            Ok(None) => tracing::debug!("An admin already exists; bootstrap skipped"),
            Err(e) => panic!("Bootstrap admin could not be created: {e}"),
        }
    }

    tokio::fs::create_dir_all(config.storage.media_root.join(spmc_core::tiling::TILES_DIR))
        .await
        .expect("MEDIA_ROOT is not writable");

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Could not bind {addr}: {e}"));
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server terminated with an error");
    tracing::info!("Shut down cleanly");
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Could not install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("SIGINT received"),
            _ = sigterm.recv() => tracing::info!("SIGTERM received"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Ctrl-C received");
    }
}
