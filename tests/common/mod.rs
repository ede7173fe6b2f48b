#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use techconnect_api::{apply_migrations, build_router, builtin_config, resolve, AppState, Database, Settings};
use tower::ServiceExt;

/// Application over a fresh in-memory SQLite database.
pub async fn app() -> Router {
    app_with(&[]).await
}

/// Same as [`app`] with extra environment-style settings.
pub async fn app_with(vars: &[(&str, &str)]) -> Router {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("DATABASE_URL".into(), "sqlite::memory:".into());
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }
    let settings = Settings::from_lookup(|k| env.get(k).cloned()).unwrap();

    let config = builtin_config().unwrap();
    let model = resolve(&config).unwrap();
    let db = Database::connect(&settings.database_url, settings.db_max_connections)
        .await
        .unwrap();
    apply_migrations(&db, &model).await.unwrap();

    let state = AppState {
        db,
        model: Arc::new(model),
        expose_storage_errors: settings.expose_storage_errors,
    };
    build_router(state, &settings)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn patch(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

/// Create a row and return its body, failing the test on anything but 201.
pub async fn create(app: &Router, path: &str, body: Value) -> Value {
    let (status, json) = post(app, &format!("/api/{}", path), body).await;
    assert_eq!(status, StatusCode::CREATED, "creating {}: {}", path, json);
    json
}

/// Patient, tumor, biomodel, passage and trial chain. Returns the trial id.
pub async fn seed_trial(app: &Router, nhc: &str) -> String {
    create(app, "patients", serde_json::json!({"nhc": nhc, "sex": "F"})).await;
    let code = format!("{}-T1", nhc);
    create(app, "tumors", serde_json::json!({"biobank_code": code, "patient_nhc": nhc})).await;
    let biomodel = create(app, "biomodels", serde_json::json!({"tumor_biobank_code": code})).await;
    let passage = create(app, "passages", serde_json::json!({"biomodel_id": biomodel["id"]})).await;
    let trial = create(app, "trials", serde_json::json!({"passage_id": passage["id"]})).await;
    trial["id"].as_str().unwrap().to_string()
}
