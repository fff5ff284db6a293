use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("provider not registered: {0}")]
    ProviderNotFound(String),

    #[error("token exchange with '{provider}' failed: {reason}")]
    TokenExchange { provider: String, reason: String },

    #[error("consent request to '{provider}' failed: {reason}")]
    ConsentRequest { provider: String, reason: String },

    #[error("account fetch from '{provider}' failed: {reason}")]
    AccountFetch { provider: String, reason: String },

    #[error("{}", persistence_message(.source, .rollback))]
    Persistence {
        source: sqlx::Error,
        /// Error from the rollback itself, if rolling back also failed.
        /// Reported jointly with the triggering error, never dropped.
        rollback: Option<sqlx::Error>,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn persistence_message(source: &sqlx::Error, rollback: &Option<sqlx::Error>) -> String {
    match rollback {
        Some(rb) => format!("persistence failed: {source}; rollback also failed: {rb}"),
        None => format!("persistence failed: {source}"),
    }
}

impl From<sqlx::Error> for AppError {
    fn from(source: sqlx::Error) -> Self {
        AppError::Persistence {
            source,
            rollback: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::ProviderNotFound(name) => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "provider_not_found",
                format!("provider not registered: {}", name),
            ),
            AppError::TokenExchange { provider, .. } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "token_exchange_failed",
                format!("token exchange with '{}' failed", provider),
            ),
            AppError::ConsentRequest { provider, .. } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "consent_request_failed",
                format!("consent request to '{}' failed", provider),
            ),
            AppError::AccountFetch { provider, .. } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "account_fetch_failed",
                format!("account fetch from '{}' failed", provider),
            ),
            AppError::Persistence { .. } => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
