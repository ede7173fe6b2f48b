//! Convert canonical column values to types the `Any` driver can bind.

use crate::config::ColumnType;
use crate::service::FieldValue;
use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;

/// A value bound to a query. Dates and UUIDs travel as text; placeholders cast them on PostgreSQL.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
}

impl BindValue {
    /// Typed so that a null still carries the column's kind.
    pub fn from_field(value: &FieldValue, ty: ColumnType) -> Self {
        match value {
            FieldValue::Null => match ty {
                ColumnType::Int => BindValue::Int(None),
                ColumnType::Float => BindValue::Float(None),
                ColumnType::Bool => BindValue::Bool(None),
                ColumnType::Text | ColumnType::Date | ColumnType::Uuid => BindValue::Text(None),
            },
            FieldValue::Text(s) => BindValue::Text(Some(s.clone())),
            FieldValue::Int(n) => BindValue::Int(Some(*n)),
            FieldValue::Float(f) => BindValue::Float(Some(*f)),
            FieldValue::Bool(b) => BindValue::Bool(Some(*b)),
            FieldValue::Date(_) | FieldValue::Uuid(_) => match value.to_json() {
                serde_json::Value::String(s) => BindValue::Text(Some(s)),
                _ => BindValue::Text(None),
            },
        }
    }
}

/// Bind parameters in placeholder order.
pub fn bind_all<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    params: &[BindValue],
) -> Query<'q, Any, AnyArguments<'q>> {
    for p in params {
        query = match p {
            BindValue::Text(v) => query.bind(v.clone()),
            BindValue::Int(v) => query.bind(*v),
            BindValue::Float(v) => query.bind(*v),
            BindValue::Bool(v) => query.bind(*v),
        };
    }
    query
}
