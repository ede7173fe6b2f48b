//! Entity CRUD routes built from the resolved model.
//! Each entity gets its own sub-router carrying its descriptor as an extension; the generic
//! handlers read it from there.

use crate::config::ResolvedModel;
use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

/// GET/POST `/api/{path}` and GET/PATCH/DELETE `/api/{path}/:id` for every entity.
pub fn entity_routes(model: &ResolvedModel) -> Router<AppState> {
    model.entities.iter().fold(Router::new(), |router, entity| {
        let base = format!("/api/{}", entity.path_segment);
        let sub = Router::new()
            .route(&base, get(list).post(create))
            .route(&format!("{}/:id", base), get(read).patch(update).delete(delete_handler))
            .layer(Extension(Arc::clone(entity)));
        tracing::debug!(path = %base, entity = %entity.name, "entity routes registered");
        router.merge(sub)
    })
}
