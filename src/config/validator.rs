//! Declaration validation: referential integrity and API consistency.

use crate::config::{ColumnConfig, ColumnType, FullConfig};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    if config.tables.is_empty() {
        return Err(ConfigError::Validation("at least one table required".into()));
    }

    let mut table_position: HashMap<&str, usize> = HashMap::new();
    for (i, t) in config.tables.iter().enumerate() {
        if table_position.insert(t.id.as_str(), i).is_some() {
            return Err(ConfigError::Validation(format!("duplicate table id: {}", t.id)));
        }
    }

    let mut columns_by_table: HashMap<&str, Vec<&ColumnConfig>> = HashMap::new();
    for c in &config.columns {
        if !table_position.contains_key(c.table_id.as_str()) {
            return Err(ConfigError::MissingReference {
                kind: "table",
                id: c.table_id.clone(),
            });
        }
        let cols = columns_by_table.entry(c.table_id.as_str()).or_default();
        if cols.iter().any(|existing| existing.name == c.name) {
            return Err(ConfigError::Validation(format!(
                "duplicate column {} in table {}",
                c.name, c.table_id
            )));
        }
        validate_column_type(c)?;
        cols.push(c);
    }

    for t in &config.tables {
        let has_pk = columns_by_table
            .get(t.id.as_str())
            .map(|cols| cols.iter().any(|c| c.name == t.primary_key))
            .unwrap_or(false);
        if !has_pk {
            return Err(ConfigError::InvalidPrimaryKey {
                table_id: t.id.clone(),
                column: t.primary_key.clone(),
            });
        }
    }

    let mut fk_columns = HashSet::new();
    for r in &config.relationships {
        if !fk_columns.insert((r.from_table_id.as_str(), r.from_column.as_str())) {
            return Err(ConfigError::Validation(format!(
                "relationship {}: column {}.{} already references another table",
                r.id, r.from_table_id, r.from_column
            )));
        }
        let missing = || ConfigError::MissingReference {
            kind: "relationship",
            id: r.id.clone(),
        };
        let from_pos = *table_position.get(r.from_table_id.as_str()).ok_or_else(missing)?;
        let to_pos = *table_position.get(r.to_table_id.as_str()).ok_or_else(missing)?;
        let from_col = find_column(&columns_by_table, &r.from_table_id, &r.from_column).ok_or_else(missing)?;
        let to_col = find_column(&columns_by_table, &r.to_table_id, &r.to_column).ok_or_else(missing)?;

        let target_pk = &config.tables[to_pos].primary_key;
        if *target_pk != r.to_column {
            return Err(ConfigError::Validation(format!(
                "relationship {}: target column {} is not the primary key of {}",
                r.id, r.to_column, r.to_table_id
            )));
        }
        if ColumnType::from_declared(from_col.type_.name()) != ColumnType::from_declared(to_col.type_.name()) {
            return Err(ConfigError::Validation(format!(
                "relationship {}: column types of {}.{} and {}.{} differ",
                r.id, r.from_table_id, r.from_column, r.to_table_id, r.to_column
            )));
        }
        if to_pos >= from_pos {
            return Err(ConfigError::Validation(format!(
                "relationship {}: table {} must be declared before {}",
                r.id, r.to_table_id, r.from_table_id
            )));
        }
    }

    let mut path_segments = HashSet::new();
    for api in &config.api_entities {
        if !table_position.contains_key(api.entity_id.as_str()) {
            return Err(ConfigError::MissingReference {
                kind: "table",
                id: api.entity_id.clone(),
            });
        }
        if !path_segments.insert(api.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(api.path_segment.clone()));
        }
    }

    Ok(())
}

fn find_column<'a>(
    columns_by_table: &HashMap<&str, Vec<&'a ColumnConfig>>,
    table_id: &str,
    name: &str,
) -> Option<&'a ColumnConfig> {
    columns_by_table
        .get(table_id)
        .and_then(|cols| cols.iter().find(|c| c.name == name).copied())
}

fn validate_column_type(c: &ColumnConfig) -> Result<(), ConfigError> {
    let declared = c.type_.name();
    let Some(kind) = ColumnType::from_declared(declared) else {
        return Err(ConfigError::Validation(format!(
            "column {}.{}: unsupported type {}",
            c.table_id, c.name, declared
        )));
    };
    let params = c.type_.params();
    if declared.eq_ignore_ascii_case("varchar") {
        if params.len() != 1 || params[0] == 0 {
            return Err(ConfigError::Validation(format!(
                "column {}.{}: varchar needs one positive length",
                c.table_id, c.name
            )));
        }
    } else if !params.is_empty() {
        return Err(ConfigError::Validation(format!(
            "column {}.{}: type {} takes no parameters",
            c.table_id, c.name, declared
        )));
    }
    if c.default.is_some() && kind != ColumnType::Uuid {
        return Err(ConfigError::Validation(format!(
            "column {}.{}: uuid4 default needs a uuid column",
            c.table_id, c.name
        )));
    }
    Ok(())
}
