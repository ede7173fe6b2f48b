//! Resolved entity model: declarations validated and flattened for runtime use.

use std::collections::HashMap;
use std::sync::Arc;

/// Canonical value kind of a column. Drives coercion, binding, decoding and DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Int,
    Float,
    Bool,
    Date,
    Uuid,
}

impl ColumnType {
    /// Map a declared type name (case-insensitive) to a column kind.
    pub fn from_declared(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "text" | "varchar" => ColumnType::Text,
            "integer" | "int" | "bigint" => ColumnType::Int,
            "double" | "double precision" | "real" | "float" => ColumnType::Float,
            "boolean" | "bool" => ColumnType::Bool,
            "date" => ColumnType::Date,
            "uuid" => ColumnType::Uuid,
            _ => return None,
        })
    }
}

/// Target of a foreign key column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKey {
    /// Constraint name, the relationship id.
    pub name: String,
    pub table: String,
    pub column: String,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
    /// Character limit for `varchar(n)` columns.
    pub max_length: Option<u32>,
    /// Server generates a v4 UUID on create when absent.
    pub generated: bool,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnInfo {
    /// A create payload must supply this column.
    pub fn required(&self) -> bool {
        !self.nullable && !self.generated
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub table_name: String,
    pub path_segment: String,
    pub name: String,
    pub label: String,
    pub pk_column: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn pk(&self) -> &ColumnInfo {
        // resolve() guarantees the primary key column is present
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .unwrap_or(&self.columns[0])
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.name)
    }
}

/// A declared table with resolved columns. Exposed or not, every table is materialised.
#[derive(Clone, Debug)]
pub struct ResolvedTable {
    pub id: String,
    pub name: String,
    pub primary_key: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    /// Tables in declaration order (referenced tables first).
    pub tables: Vec<ResolvedTable>,
    /// Entities in API declaration order.
    pub entities: Vec<Arc<ResolvedEntity>>,
    pub entity_by_path: HashMap<String, Arc<ResolvedEntity>>,
}

impl ResolvedModel {
    pub fn entity_by_path(&self, path: &str) -> Option<&Arc<ResolvedEntity>> {
        self.entity_by_path.get(path)
    }
}
