//! Response helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

/// Body of a successful delete.
#[derive(Serialize)]
pub struct Deleted {
    pub ok: bool,
}

pub fn created(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(data))
}

pub fn many(data: Vec<Value>) -> (StatusCode, Json<Vec<Value>>) {
    (StatusCode::OK, Json(data))
}

pub fn deleted() -> (StatusCode, Json<Deleted>) {
    (StatusCode::OK, Json(Deleted { ok: true }))
}
