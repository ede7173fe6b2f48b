//! Create the declared tables and exit.
//!
//! Run from repo root: `cargo run -p techconnect-server --bin init-db`

use techconnect_api::{apply_migrations, load_config, resolve, Database, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("techconnect_api=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let config = load_config(&settings).await?;
    let model = resolve(&config)?;

    let db = Database::connect(&settings.database_url, 1).await?;
    apply_migrations(&db, &model).await?;
    db.close().await;
    tracing::info!(tables = model.tables.len(), "database initialised");
    Ok(())
}
