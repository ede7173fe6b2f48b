//! Generic CRUD execution on a request session.

use crate::config::{ColumnInfo, ColumnType, ResolvedEntity};
use crate::error::AppError;
use crate::service::coerce::{coerce_record, record_to_map, FieldValue, Record};
use crate::sql::{bind_all, delete, insert, select_by_id, select_list, update, QueryBuf};
use crate::store::Session;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use uuid::Uuid;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 100;

pub struct CrudService;

impl CrudService {
    /// List rows ordered by key; limit defaults to 100 and is clamped to 100, offset defaults to 0.
    pub async fn list(
        session: &mut Session,
        entity: &ResolvedEntity,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, AppError> {
        let limit = limit.map_or(DEFAULT_LIMIT, |l| l.min(u64::from(MAX_LIMIT)) as u32);
        // storage engines take a signed 64-bit offset
        let offset = offset.unwrap_or(0).min(i64::MAX as u64);
        let q = select_list(session.dialect(), entity, limit, offset);
        let rows = fetch_all(&mut *session, &q).await?;
        rows.iter().map(|r| decode_row(entity, r)).collect()
    }

    /// Fetch one row by primary key.
    pub async fn read(session: &mut Session, entity: &ResolvedEntity, id: &FieldValue) -> Result<Option<Record>, AppError> {
        let q = select_by_id(session.dialect(), entity, id);
        fetch_one(&mut *session, entity, &q).await
    }

    /// Coerce and insert a full payload in a transaction; returns the stored row.
    ///
    /// A missing generated key is filled with a fresh v4 UUID. When the storage engine rejects
    /// the insert the transaction is rolled back and `AppError::Storage` carries its message.
    pub async fn create(
        session: &mut Session,
        entity: &ResolvedEntity,
        payload: &Map<String, Value>,
    ) -> Result<Record, AppError> {
        let mut record = coerce_record(entity, payload)?;
        for c in entity.columns.iter().filter(|c| c.generated) {
            record
                .entry(c.name.clone())
                .or_insert_with(|| FieldValue::Uuid(Uuid::new_v4()));
        }
        let id = record.get(&entity.pk().name).cloned().unwrap_or(FieldValue::Null);

        let dialect = session.dialect();
        let mut tx = session.begin().await?;
        let q = insert(dialect, entity, &record);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        match bind_all(sqlx::query(&q.sql), &q.params).execute(&mut *tx).await {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) => {
                tracing::warn!(entity = %entity.name, error = %e, "insert rejected by storage");
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                return Err(AppError::Storage(e.message().to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        let stored = fetch_one(&mut *tx, entity, &select_by_id(dialect, entity, &id))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(stored)
    }

    /// Partial update by merge-validate-extract, inside one transaction.
    ///
    /// The payload's declared non-key fields are laid over the stored row, the merged record is
    /// coerced as a whole, and only those fields are written back. Returns `None` when the row
    /// does not exist.
    pub async fn update(
        session: &mut Session,
        entity: &ResolvedEntity,
        id: &FieldValue,
        payload: &Map<String, Value>,
    ) -> Result<Option<Record>, AppError> {
        let dialect = session.dialect();
        let mut tx = session.begin().await?;
        let Some(current) = fetch_one(&mut *tx, entity, &select_by_id(dialect, entity, id)).await? else {
            return Ok(None);
        };

        let mentioned: Vec<&ColumnInfo> = entity
            .columns
            .iter()
            .filter(|c| !c.primary_key && payload.contains_key(&c.name))
            .collect();
        if mentioned.is_empty() {
            tx.commit().await?;
            return Ok(Some(current));
        }

        let mut merged = record_to_map(entity, &current);
        for c in &mentioned {
            if let Some(v) = payload.get(&c.name) {
                merged.insert(c.name.clone(), v.clone());
            }
        }
        let validated = coerce_record(entity, &merged)?;
        let changes: Vec<(&ColumnInfo, FieldValue)> = mentioned
            .into_iter()
            .map(|c| (c, validated.get(&c.name).cloned().unwrap_or(FieldValue::Null)))
            .collect();

        if let Some(q) = update(dialect, entity, id, &changes) {
            tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
            bind_all(sqlx::query(&q.sql), &q.params).execute(&mut *tx).await?;
        }
        let updated = fetch_one(&mut *tx, entity, &select_by_id(dialect, entity, id)).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Delete by primary key. Returns whether a row was removed.
    pub async fn delete(session: &mut Session, entity: &ResolvedEntity, id: &FieldValue) -> Result<bool, AppError> {
        let q = delete(session.dialect(), entity, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let result = bind_all(sqlx::query(&q.sql), &q.params).execute(&mut **session).await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn fetch_all(conn: &mut AnyConnection, q: &QueryBuf) -> Result<Vec<AnyRow>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    Ok(bind_all(sqlx::query(&q.sql), &q.params).fetch_all(conn).await?)
}

async fn fetch_one(conn: &mut AnyConnection, entity: &ResolvedEntity, q: &QueryBuf) -> Result<Option<Record>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let row = bind_all(sqlx::query(&q.sql), &q.params).fetch_optional(conn).await?;
    row.map(|r| decode_row(entity, &r)).transpose()
}

/// Read every declared column of a row back into canonical values.
fn decode_row(entity: &ResolvedEntity, row: &AnyRow) -> Result<Record, AppError> {
    entity
        .columns
        .iter()
        .map(|c| Ok((c.name.clone(), decode_cell(row, c)?)))
        .collect()
}

fn decode_cell(row: &AnyRow, column: &ColumnInfo) -> Result<FieldValue, AppError> {
    let name = column.name.as_str();
    let value = match column.column_type {
        ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(FieldValue::Text),
        ColumnType::Int => row.try_get::<Option<i64>, _>(name)?.map(FieldValue::Int),
        ColumnType::Float => match row.try_get::<Option<f64>, _>(name) {
            Ok(v) => v.map(FieldValue::Float),
            // SQLite hands back whole REAL values as integers
            Err(_) => row.try_get::<Option<i64>, _>(name)?.map(|n| FieldValue::Float(n as f64)),
        },
        ColumnType::Bool => match row.try_get::<Option<bool>, _>(name) {
            Ok(v) => v.map(FieldValue::Bool),
            Err(_) => row.try_get::<Option<i64>, _>(name)?.map(|n| FieldValue::Bool(n != 0)),
        },
        ColumnType::Date => match row.try_get::<Option<String>, _>(name)? {
            Some(s) => Some(FieldValue::Date(
                NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| decode_error(name, e))?,
            )),
            None => None,
        },
        ColumnType::Uuid => match row.try_get::<Option<String>, _>(name)? {
            Some(s) => Some(FieldValue::Uuid(Uuid::parse_str(&s).map_err(|e| decode_error(name, e))?)),
            None => None,
        },
    };
    Ok(value.unwrap_or(FieldValue::Null))
}

fn decode_error<E>(column: &str, source: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::Db(sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    })
}
