//! CrudService: generic CRUD using safe SQL builder and payload coercion.

pub mod coerce;
mod crud;
pub use coerce::{coerce_key, coerce_record, record_to_json, FieldValue, Record};
pub use crud::{CrudService, DEFAULT_LIMIT, MAX_LIMIT};
