//! Runtime settings read from the environment.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://techconnect.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    /// Declaration file replacing the embedded schema.
    pub schema_path: Option<PathBuf>,
    /// Create responses carry the raw storage message when set.
    pub expose_storage_errors: bool,
    pub max_body_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = match get("DATABASE_URL") {
            Some(raw) => normalize_database_url(&raw)?,
            None => {
                tracing::warn!(url = DEFAULT_DATABASE_URL, "DATABASE_URL not set, using local SQLite database");
                DEFAULT_DATABASE_URL.to_string()
            }
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::Validation(format!("BIND_ADDR: invalid socket address {}", bind_raw)))?;

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "DB_MAX_CONNECTIONS: expected a positive integer, got {}",
                        v
                    )))
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let expose_storage_errors = match get("EXPOSE_STORAGE_ERRORS") {
            Some(v) => parse_flag(&v)
                .ok_or_else(|| ConfigError::Validation(format!("EXPOSE_STORAGE_ERRORS: expected a boolean, got {}", v)))?,
            None => true,
        };

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Validation(format!("MAX_BODY_BYTES: expected a byte count, got {}", v)))?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Settings {
            database_url,
            bind_addr,
            cors_origins,
            db_max_connections,
            schema_path: get("SCHEMA_PATH").map(PathBuf::from),
            expose_storage_errors,
            max_body_bytes,
        })
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Rewrite SQLAlchemy-style URLs into the form the driver accepts.
///
/// `postgresql+psycopg2://...` loses its driver suffix and `sqlite:///file.db` becomes
/// `sqlite://file.db?mode=rwc`, so a missing database file is created on first start.
/// Schemes other than PostgreSQL and SQLite are rejected.
pub fn normalize_database_url(raw: &str) -> Result<String, ConfigError> {
    let (scheme, rest) = raw
        .split_once(':')
        .ok_or_else(|| ConfigError::Validation(format!("DATABASE_URL: missing scheme in {}", raw)))?;
    let base = scheme.split('+').next().unwrap_or(scheme).to_ascii_lowercase();
    match base.as_str() {
        "postgres" | "postgresql" => Ok(format!("{}:{}", base, rest)),
        "sqlite" => {
            let url = match rest.strip_prefix("///") {
                Some(path) => format!("sqlite://{}", path),
                None => format!("sqlite:{}", rest),
            };
            Ok(with_create_mode(url))
        }
        other => Err(ConfigError::Validation(format!("DATABASE_URL: unsupported scheme {}", other))),
    }
}

/// File databases without an explicit `mode` are opened read-write-create.
fn with_create_mode(url: String) -> String {
    if url.contains(":memory:") || url.contains("mode=") {
        return url;
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}mode=rwc", url, sep)
}
