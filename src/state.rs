//! Shared application state for all routes.

use crate::config::ResolvedModel;
use crate::store::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub model: Arc<ResolvedModel>,
    /// Create responses carry the raw storage message when set.
    pub expose_storage_errors: bool,
}
