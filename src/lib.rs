//! TechConnect API: generic CRUD backend over a declared biomedical research schema.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{builtin_config, load_from_file, resolve, FullConfig, ResolvedEntity, ResolvedModel, ResolvedTable};
pub use error::{AppError, ConfigError, FieldError};
pub use migration::apply_migrations;
pub use routes::{build_router, common_routes, entity_routes};
pub use service::CrudService;
pub use settings::Settings;
pub use sql::Dialect;
pub use state::AppState;
pub use store::{Database, Session};

/// Declarations from `SCHEMA_PATH` when set, otherwise the embedded schema.
pub async fn load_config(settings: &Settings) -> Result<FullConfig, ConfigError> {
    match &settings.schema_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading schema declarations from file");
            load_from_file(path).await
        }
        None => builtin_config(),
    }
}
