//! SQL flavour selected from the connection URL.

use crate::config::ColumnType;
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(ConfigError::Validation(format!("unsupported database scheme: {}", scheme))),
        }
    }

    /// Placeholder for the n-th (1-based) bound parameter, cast where the driver binds text.
    pub fn placeholder(self, n: usize, ty: ColumnType) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => match ty {
                ColumnType::Uuid => format!("${}::uuid", n),
                ColumnType::Date => format!("${}::date", n),
                _ => format!("${}", n),
            },
        }
    }

    /// Column type used in CREATE TABLE.
    pub fn column_type(self, ty: ColumnType, max_length: Option<u32>) -> String {
        match (self, ty) {
            (_, ColumnType::Text) => match max_length {
                Some(n) => format!("VARCHAR({})", n),
                None => "TEXT".to_string(),
            },
            (Dialect::Postgres, ColumnType::Int) => "BIGINT".to_string(),
            (Dialect::Sqlite, ColumnType::Int) => "INTEGER".to_string(),
            (Dialect::Postgres, ColumnType::Float) => "DOUBLE PRECISION".to_string(),
            (Dialect::Sqlite, ColumnType::Float) => "REAL".to_string(),
            (Dialect::Postgres, ColumnType::Bool) => "BOOLEAN".to_string(),
            // a BOOLEAN declaration makes SQLite report a type the Any driver cannot decode
            (Dialect::Sqlite, ColumnType::Bool) => "INTEGER".to_string(),
            (Dialect::Postgres, ColumnType::Date) => "DATE".to_string(),
            (Dialect::Postgres, ColumnType::Uuid) => "UUID".to_string(),
            (Dialect::Sqlite, ColumnType::Date | ColumnType::Uuid) => "TEXT".to_string(),
        }
    }

    /// Whether a selected column has to be read back as text.
    pub fn selects_as_text(self, ty: ColumnType) -> bool {
        self == Dialect::Postgres && matches!(ty, ColumnType::Date | ColumnType::Uuid)
    }
}
