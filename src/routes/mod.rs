//! Router assembly.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::settings::Settings;
use crate::state::AppState;
use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Full application: fixed endpoints plus CRUD for every entity, with tracing, body limit and CORS.
pub fn build_router(state: AppState, settings: &Settings) -> Router {
    common_routes()
        .merge(entity_routes(&state.model))
        .with_state(state)
        .layer(
            // limit outermost: Cors needs a response body with Default
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&settings.cors_origins)),
        )
}

/// Allowed origins with credentials; methods and headers mirror the request.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
