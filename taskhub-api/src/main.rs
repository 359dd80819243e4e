//! # TaskHub API Server
//!
//! REST backend for collaborative projects and tasks.
//!
//! ## Usage
//!
//! ```bash
//! STORAGE=memory JWT_SECRET=... cargo run -p taskhub-api
//! ```
//!
//! See [`taskhub_api::config`] for every environment variable.

use taskhub_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use taskhub_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use taskhub_shared::store::Stores;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskhub_api=debug,taskhub_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TaskHub API Server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let (stores, pool) = match config.storage {
        StorageBackend::Postgres => {
            let pool = create_pool(
                DatabaseConfig::new(config.database.url.clone())
                    .with_max_connections(config.database.max_connections),
            )
            .await?;
            run_migrations(&pool).await?;
            (Stores::postgres(pool.clone()), Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            (Stores::in_memory(), None)
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(stores, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    tracing::info!("Shutdown complete");

    Ok(())
}
