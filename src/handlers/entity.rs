//! Entity CRUD handlers: list, read, create, update, delete.
//! One handler per verb; the entity comes from the per-entity router layer.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::response;
use crate::service::{coerce_key, record_to_json, CrudService, FieldValue};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(Value::Object(m))) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

/// Unparseable ids cannot name a row, so they are reported as not found.
fn parse_id(entity: &ResolvedEntity, raw: &str) -> Result<FieldValue, AppError> {
    coerce_key(entity, raw).ok_or_else(|| AppError::NotFound(entity.not_found_message()))
}

pub async fn list(
    Extension(entity): Extension<Arc<ResolvedEntity>>,
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params.map_err(|r| AppError::BadRequest(r.body_text()))?;
    let mut session = state.db.session().await?;
    let rows = CrudService::list(&mut session, &entity, params.limit, params.offset).await?;
    Ok(response::many(rows.iter().map(|r| record_to_json(&entity, r)).collect()))
}

pub async fn read(
    Extension(entity): Extension<Arc<ResolvedEntity>>,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&entity, &id_str)?;
    let mut session = state.db.session().await?;
    let row = CrudService::read(&mut session, &entity, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.not_found_message()))?;
    Ok(response::ok(record_to_json(&entity, &row)))
}

pub async fn create(
    Extension(entity): Extension<Arc<ResolvedEntity>>,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    let mut session = state.db.session().await?;
    let row = match CrudService::create(&mut session, &entity, &body).await {
        Ok(row) => row,
        Err(AppError::Storage(_)) if !state.expose_storage_errors => {
            return Err(AppError::Storage(format!("could not store {}", entity.name)));
        }
        Err(e) => return Err(e),
    };
    Ok(response::created(record_to_json(&entity, &row)))
}

pub async fn update(
    Extension(entity): Extension<Arc<ResolvedEntity>>,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    let id = parse_id(&entity, &id_str)?;
    let mut session = state.db.session().await?;
    let row = CrudService::update(&mut session, &entity, &id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.not_found_message()))?;
    Ok(response::ok(record_to_json(&entity, &row)))
}

pub async fn delete(
    Extension(entity): Extension<Arc<ResolvedEntity>>,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&entity, &id_str)?;
    let mut session = state.db.session().await?;
    if !CrudService::delete(&mut session, &entity, &id).await? {
        return Err(AppError::NotFound(entity.not_found_message()));
    }
    Ok(response::deleted())
}
