//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from resolved entity.

use crate::config::{ColumnInfo, ResolvedEntity};
use crate::service::FieldValue;
use crate::sql::{BindValue, Dialect};

/// Quote identifier (safe: only from declarations).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
    dialect: Dialect,
}

impl QueryBuf {
    fn new(dialect: Dialect) -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Record a bound value and return its placeholder.
    fn push_param(&mut self, column: &ColumnInfo, value: &FieldValue) -> String {
        self.params.push(BindValue::from_field(value, column.column_type));
        self.dialect.placeholder(self.params.len(), column.column_type)
    }
}

/// SELECT list in declaration order; kinds the driver cannot decode are read as text.
fn select_column_list(dialect: Dialect, entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            if dialect.selects_as_text(c.column_type) {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key.
pub fn select_by_id(dialect: Dialect, entity: &ResolvedEntity, id: &FieldValue) -> QueryBuf {
    let mut q = QueryBuf::new(dialect);
    let pk = entity.pk();
    let ph = q.push_param(pk, id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(dialect, entity),
        quoted(&entity.table_name),
        quoted(&pk.name),
        ph
    );
    q
}

/// SELECT page ordered by primary key.
pub fn select_list(dialect: Dialect, entity: &ResolvedEntity, limit: u32, offset: u64) -> QueryBuf {
    let mut q = QueryBuf::new(dialect);
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(dialect, entity),
        quoted(&entity.table_name),
        quoted(&entity.pk().name),
        limit,
        offset
    );
    q
}

/// INSERT every column present in the record, in declaration order.
pub fn insert(dialect: Dialect, entity: &ResolvedEntity, record: &crate::service::Record) -> QueryBuf {
    let mut q = QueryBuf::new(dialect);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        let Some(value) = record.get(&c.name) else { continue };
        placeholders.push(q.push_param(c, value));
        cols.push(quoted(&c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(&entity.table_name),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by id: SET only the given columns. The key column is never assigned.
/// Returns `None` when nothing is left to set.
pub fn update(
    dialect: Dialect,
    entity: &ResolvedEntity,
    id: &FieldValue,
    changes: &[(&ColumnInfo, FieldValue)],
) -> Option<QueryBuf> {
    let mut q = QueryBuf::new(dialect);
    let mut sets = Vec::new();
    for (c, v) in changes {
        if c.primary_key {
            continue;
        }
        let ph = q.push_param(c, v);
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    if sets.is_empty() {
        return None;
    }
    let pk = entity.pk();
    let id_ph = q.push_param(pk, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(&entity.table_name),
        sets.join(", "),
        quoted(&pk.name),
        id_ph
    );
    Some(q)
}

/// DELETE by id.
pub fn delete(dialect: Dialect, entity: &ResolvedEntity, id: &FieldValue) -> QueryBuf {
    let mut q = QueryBuf::new(dialect);
    let pk = entity.pk();
    let ph = q.push_param(pk, id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quoted(&entity.table_name),
        quoted(&pk.name),
        ph
    );
    q
}
