//! Common routes: root banner, health, readiness, version, info.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct RootBody {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

#[derive(Serialize)]
struct EntitySummary {
    path: String,
    name: String,
    label: String,
}

#[derive(Serialize)]
struct InfoBody {
    name: &'static str,
    version: &'static str,
    entities: Vec<EntitySummary>,
}

async fn root() -> Json<RootBody> {
    Json(RootBody {
        status: "ok",
        message: "TechConnect API is running",
    })
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    if let Err(e) = state.db.ping().await {
        tracing::warn!(error = %e, "readiness check failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: "ok",
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn info(State(state): State<AppState>) -> Json<InfoBody> {
    let entities = state
        .model
        .entities
        .iter()
        .map(|e| EntitySummary {
            path: format!("/api/{}", e.path_segment),
            name: e.name.clone(),
            label: e.label.clone(),
        })
        .collect();
    Json(InfoBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        entities,
    })
}

/// GET /, /api/health, /ready, /version, /info.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/info", get(info))
}
