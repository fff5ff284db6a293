use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::account::Account;
use crate::models::consent::AccountConsent;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub client_id: String,
    pub permissions: Vec<String>,
    #[serde(default)]
    pub reason: String,
    pub requesting_bank: String,
    #[serde(default)]
    pub requesting_bank_name: String,
}

impl From<ConsentRequest> for AccountConsent {
    fn from(req: ConsentRequest) -> Self {
        AccountConsent {
            client_id: req.client_id,
            permissions: req.permissions,
            reason: req.reason,
            requesting_bank: req.requesting_bank,
            requesting_bank_name: req.requesting_bank_name,
            status: String::new(),
            consent_id: String::new(),
            auto_approved: false,
            consent_provider: String::new(),
        }
    }
}

#[derive(Serialize)]
pub struct CreateConsentResponse {
    pub consent_id: String,
}

#[derive(Deserialize)]
pub struct AccountsQuery {
    pub client_id: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// `POST /api/v1/consents` — batch consent creation, one entry per provider.
pub async fn create_consents(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HashMap<String, ConsentRequest>>,
) -> Result<Json<HashMap<String, AccountConsent>>, AppError> {
    let consents = body
        .into_iter()
        .map(|(provider, req)| (provider, AccountConsent::from(req)))
        .collect();
    let stored = state.consents.create_consents(consents).await?;
    Ok(Json(stored))
}

/// `POST /api/v1/consent` — single-provider consent creation.
pub async fn create_consent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConsentRequest>,
) -> Result<Json<CreateConsentResponse>, AppError> {
    let consent_id = state
        .consents
        .create_accounts_consent(
            body.permissions,
            &body.client_id,
            &body.requesting_bank,
            &body.reason,
        )
        .await?;
    Ok(Json(CreateConsentResponse { consent_id }))
}

/// `GET /api/v1/accounts?client_id=` — aggregate accounts across all of the
/// client's active consents.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.accounts.aggregate_accounts(&query.client_id).await?;
    Ok(Json(accounts))
}
