use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod handlers;

/// Build the service API router.
/// All routes are relative — the caller mounts this under `/api/v1`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/consents", post(handlers::create_consents))
        .route("/consent", post(handlers::create_consent))
        .route("/accounts", get(handlers::list_accounts))
}
