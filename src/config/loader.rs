//! Load declarations from the embedded schema file or a JSON file on disk, and resolve them.

use crate::config::resolved::{ColumnInfo, ColumnType, ForeignKey, ResolvedEntity, ResolvedModel, ResolvedTable};
use crate::config::types::*;
use crate::config::{validate, FullConfig};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Schema declarations compiled into the library.
const BUILTIN_SCHEMA: &str = include_str!("../../schema/techconnect.json");

/// Parse the embedded declarations.
pub fn builtin_config() -> Result<FullConfig, ConfigError> {
    serde_json::from_str(BUILTIN_SCHEMA).map_err(|e| ConfigError::Load(format!("embedded schema: {}", e)))
}

/// Read declarations from a JSON file with the same layout as the embedded schema.
pub async fn load_from_file(path: &Path) -> Result<FullConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Build resolved model from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let tables_by_id: HashMap<_, _> = config.tables.iter().map(|t| (t.id.as_str(), t)).collect();
    let columns_by_table: HashMap<_, Vec<&ColumnConfig>> = config
        .columns
        .iter()
        .fold(HashMap::new(), |mut m, c| {
            m.entry(c.table_id.as_str()).or_default().push(c);
            m
        });

    let tables = config
        .tables
        .iter()
        .map(|table| {
            let columns = columns_by_table
                .get(table.id.as_str())
                .map(|v| v.as_slice())
                .unwrap_or(&[])
                .iter()
                .map(|c| resolve_column(c, table, config, &tables_by_id))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ResolvedTable {
                id: table.id.clone(),
                name: table.name.clone(),
                primary_key: table.primary_key.clone(),
                columns,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let mut entities = Vec::new();
    let mut entity_by_path = HashMap::new();

    for api in &config.api_entities {
        let table = tables
            .iter()
            .find(|t| t.id == api.entity_id)
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "table",
                id: api.entity_id.clone(),
            })?;

        let entity = Arc::new(ResolvedEntity {
            table_name: table.name.clone(),
            path_segment: api.path_segment.clone(),
            name: api.name.clone(),
            label: api.label.clone(),
            pk_column: table.primary_key.clone(),
            columns: table.columns.clone(),
        });
        entity_by_path.insert(api.path_segment.clone(), Arc::clone(&entity));
        entities.push(entity);
    }

    Ok(ResolvedModel {
        tables,
        entities,
        entity_by_path,
    })
}

fn resolve_column(
    c: &ColumnConfig,
    table: &TableConfig,
    config: &FullConfig,
    tables_by_id: &HashMap<&str, &TableConfig>,
) -> Result<ColumnInfo, ConfigError> {
    let column_type = ColumnType::from_declared(c.type_.name()).ok_or_else(|| {
        ConfigError::Validation(format!("column {}.{}: unsupported type {}", table.id, c.name, c.type_.name()))
    })?;
    let primary_key = c.name == table.primary_key;
    let relationship = config
        .relationships
        .iter()
        .find(|r| r.from_table_id == table.id && r.from_column == c.name);
    let references = match relationship {
        Some(r) => {
            let target = tables_by_id.get(r.to_table_id.as_str()).ok_or_else(|| ConfigError::MissingReference {
                kind: "table",
                id: r.to_table_id.clone(),
            })?;
            Some(ForeignKey {
                name: r.id.clone(),
                table: target.name.clone(),
                column: r.to_column.clone(),
            })
        }
        None => None,
    };
    let unique = !primary_key && relationship.map(|r| r.cardinality == Cardinality::OneToOne).unwrap_or(false);
    let max_length = if c.type_.name().eq_ignore_ascii_case("varchar") {
        c.type_.params().first().copied()
    } else {
        None
    };

    Ok(ColumnInfo {
        name: c.name.clone(),
        column_type,
        primary_key,
        nullable: c.nullable && !primary_key,
        max_length,
        generated: c.default == Some(ColumnDefaultConfig::Uuid4),
        unique,
        references,
    })
}
