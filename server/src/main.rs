//! TechConnect API server.
//!
//! Run from repo root: `cargo run -p techconnect-server`
//! Tables only, then exit: `cargo run -p techconnect-server --bin init-db`

use std::sync::Arc;
use techconnect_api::{apply_migrations, build_router, load_config, resolve, AppState, Database, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("techconnect_api=info,techconnect_server=info,tower_http=info")
            }),
        )
        .init();

    let settings = Settings::from_env()?;
    let config = load_config(&settings).await?;
    let model = resolve(&config)?;

    let db = Database::connect(&settings.database_url, settings.db_max_connections).await?;
    apply_migrations(&db, &model).await?;

    let state = AppState {
        db: db.clone(),
        model: Arc::new(model),
        expose_storage_errors: settings.expose_storage_errors,
    };
    let app = build_router(state, &settings);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("TechConnect API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
