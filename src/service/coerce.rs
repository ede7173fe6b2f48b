//! Coercion of loose JSON payloads into canonical column values.

use crate::config::{ColumnInfo, ColumnType, ResolvedEntity};
use crate::error::{AppError, FieldError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A canonical column value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Uuid(Uuid),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Int(n) => Value::Number((*n).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
        }
    }
}

/// Column name to canonical value.
pub type Record = HashMap<String, FieldValue>;

/// Coerce one value for a column. Returns the message to report for that field on failure.
pub fn coerce_value(column: &ColumnInfo, value: &Value) -> Result<FieldValue, String> {
    if value.is_null() {
        return if column.nullable {
            Ok(FieldValue::Null)
        } else {
            Err("may not be null".into())
        };
    }
    match column.column_type {
        ColumnType::Text => {
            let s = value.as_str().ok_or("expected a string")?;
            if let Some(max) = column.max_length {
                if s.chars().count() > max as usize {
                    return Err(format!("must be at most {} characters", max));
                }
            }
            Ok(FieldValue::Text(s.to_string()))
        }
        ColumnType::Int => coerce_int(value).map(FieldValue::Int).ok_or_else(|| "expected an integer".into()),
        ColumnType::Float => coerce_float(value).map(FieldValue::Float).ok_or_else(|| "expected a number".into()),
        ColumnType::Bool => coerce_bool(value).map(FieldValue::Bool).ok_or_else(|| "expected a boolean".into()),
        ColumnType::Date => value
            .as_str()
            .and_then(parse_date)
            .map(FieldValue::Date)
            .ok_or_else(|| "expected an ISO date (YYYY-MM-DD)".into()),
        ColumnType::Uuid => value
            .as_str()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(FieldValue::Uuid)
            .ok_or_else(|| "expected a UUID".into()),
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// ISO date, or an ISO datetime whose time part is midnight.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(d);
    }
    let datetime = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    (datetime.time() == NaiveTime::MIN).then(|| datetime.date())
}

/// Coerce a full payload against every column of the entity.
///
/// Unknown keys are ignored. Absent required columns are reported; absent optional columns
/// become null. Absent or null generated columns are left out of the record.
pub fn coerce_record(entity: &ResolvedEntity, payload: &Map<String, Value>) -> Result<Record, AppError> {
    let mut record = Record::new();
    let mut errors = Vec::new();
    for column in &entity.columns {
        match payload.get(&column.name) {
            Some(Value::Null) | None if column.generated => {}
            Some(value) => match coerce_value(column, value) {
                Ok(v) => {
                    record.insert(column.name.clone(), v);
                }
                Err(message) => errors.push(FieldError::new(&column.name, message)),
            },
            None if column.required() => errors.push(FieldError::new(&column.name, "field required")),
            None => {
                record.insert(column.name.clone(), FieldValue::Null);
            }
        }
    }
    if errors.is_empty() {
        Ok(record)
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Parse a path identifier as the entity's key. `None` means no row can match it.
pub fn coerce_key(entity: &ResolvedEntity, raw: &str) -> Option<FieldValue> {
    match entity.pk().column_type {
        ColumnType::Uuid => Uuid::parse_str(raw).ok().map(FieldValue::Uuid),
        ColumnType::Int => raw.parse().ok().map(FieldValue::Int),
        ColumnType::Text => Some(FieldValue::Text(raw.to_string())),
        ColumnType::Float | ColumnType::Bool | ColumnType::Date => None,
    }
}

/// Render a record as a JSON object, one key per declared column.
pub fn record_to_json(entity: &ResolvedEntity, record: &Record) -> Value {
    Value::Object(record_to_map(entity, record))
}

pub fn record_to_map(entity: &ResolvedEntity, record: &Record) -> Map<String, Value> {
    entity
        .columns
        .iter()
        .map(|c| {
            let v = record.get(&c.name).map(FieldValue::to_json).unwrap_or(Value::Null);
            (c.name.clone(), v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, resolve};
    use serde_json::json;
    use std::sync::Arc;

    fn entity(path: &str) -> Arc<ResolvedEntity> {
        let model = resolve(&builtin_config().unwrap()).unwrap();
        Arc::clone(model.entity_by_path(path).unwrap())
    }

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn coerces_loose_input_to_canonical_values() {
        let trial = entity("trials");
        let passage = "6F9619FF-8B86-D011-B42D-00C04FC964FF";
        let record = coerce_record(
            &trial,
            &object(json!({
                "passage_id": passage,
                "success": "yes",
                "creation_date": "2024-03-01T00:00:00Z",
                "unknown": 1
            })),
        )
        .unwrap();
        assert_eq!(
            record["passage_id"],
            FieldValue::Uuid(Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap())
        );
        assert_eq!(record["success"], FieldValue::Bool(true));
        assert_eq!(record["creation_date"], FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert_eq!(record["description"], FieldValue::Null);
        assert!(!record.contains_key("id"));
        assert!(!record.contains_key("unknown"));
    }

    #[test]
    fn reports_every_bad_field() {
        let patient = entity("patients");
        let err = coerce_record(&patient, &object(json!({"birth_date": "yesterday", "sex": 3}))).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert!(names.contains(&"nhc"));
        assert!(names.contains(&"birth_date"));
        assert!(names.contains(&"sex"));
    }

    #[test]
    fn varchar_limit_counts_characters() {
        let patient = entity("patients");
        let nhc = patient.column("nhc").unwrap();
        assert!(coerce_value(nhc, &json!("é".repeat(50))).is_ok());
        assert!(coerce_value(nhc, &json!("x".repeat(51))).is_err());
    }

    #[test]
    fn integer_accepts_whole_floats_and_numeric_strings() {
        let pdx = entity("pdx-trials");
        let weeks = pdx.column("latency_weeks").unwrap();
        assert_eq!(coerce_value(weeks, &json!(4.0)).unwrap(), FieldValue::Int(4));
        assert_eq!(coerce_value(weeks, &json!(" 12 ")).unwrap(), FieldValue::Int(12));
        assert!(coerce_value(weeks, &json!(4.5)).is_err());
        assert!(coerce_value(weeks, &json!(true)).is_err());
        let s_index = pdx.column("s_index").unwrap();
        assert_eq!(coerce_value(s_index, &json!("0.25")).unwrap(), FieldValue::Float(0.25));
    }

    #[test]
    fn datetime_must_be_midnight() {
        assert_eq!(parse_date("2024-01-31"), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T00:00:00"), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31 00:00:00.000"), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T10:30:00"), None);
        assert_eq!(parse_date("31/01/2024"), None);
    }

    #[test]
    fn null_rejected_for_required_columns() {
        let tumor = entity("tumors");
        let patient_nhc = tumor.column("patient_nhc").unwrap();
        assert_eq!(coerce_value(patient_nhc, &Value::Null).unwrap_err(), "may not be null");
    }

    #[test]
    fn unparseable_keys_match_nothing() {
        assert_eq!(coerce_key(&entity("mice"), "not-a-uuid"), None);
        assert_eq!(coerce_key(&entity("patients"), "N001"), Some(FieldValue::Text("N001".into())));
    }

    #[test]
    fn renders_every_declared_column() {
        let patient = entity("patients");
        let mut record = Record::new();
        record.insert("nhc".into(), FieldValue::Text("N001".into()));
        record.insert("birth_date".into(), FieldValue::Date(NaiveDate::from_ymd_opt(1980, 5, 17).unwrap()));
        let json = record_to_json(&patient, &record);
        assert_eq!(json["nhc"], "N001");
        assert_eq!(json["birth_date"], "1980-05-17");
        assert_eq!(json["sex"], Value::Null);
    }
}
