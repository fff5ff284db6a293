//! Consent orchestration: one concurrent task per provider, joined before
//! the batch call returns.
//!
//! The batch is all-or-nothing at the return-value level: the first failing
//! task aborts its siblings and fails the whole call with no partial map.
//! Siblings that already persisted their consent keep that side effect —
//! callers recover by re-invoking, which is idempotent at the storage layer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::Providers;
use crate::errors::AppError;
use crate::models::consent::{AccountConsent, ConsentRequestBody, ConsentResponse};
use crate::oauth::TokenService;
use crate::store::ConsentStore;

#[derive(Clone)]
pub struct ConsentService {
    tokens: TokenService,
    providers: Arc<Providers>,
    store: Arc<dyn ConsentStore>,
    http: reqwest::Client,
}

impl ConsentService {
    pub fn new(
        tokens: TokenService,
        providers: Arc<Providers>,
        store: Arc<dyn ConsentStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            tokens,
            providers,
            store,
            http,
        }
    }

    /// Submit one consent request per provider concurrently, persist each
    /// successful result, and collect the stored consents keyed by provider.
    ///
    /// Task outputs flow back through the `JoinSet`, so each provider key is
    /// written exactly once by the collecting parent.
    pub async fn create_consents(
        &self,
        consents: HashMap<String, AccountConsent>,
    ) -> Result<HashMap<String, AccountConsent>, AppError> {
        let mut tasks = JoinSet::new();
        for (provider, consent) in consents {
            let svc = self.clone();
            tasks.spawn(async move {
                let stored = svc.request_and_store(&provider, consent).await?;
                Ok::<_, AppError>((provider, stored))
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((provider, consent))) => {
                    results.insert(provider, consent);
                }
                Ok(Err(e)) => {
                    // In-flight sibling requests may still complete; their
                    // results are discarded with the batch.
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(AppError::Internal(anyhow::anyhow!(
                        "consent task did not complete: {e}"
                    )));
                }
            }
        }
        Ok(results)
    }

    /// Single-provider flow: build the consent, submit it to `bank`, persist
    /// and return the provider-assigned consent id.
    pub async fn create_accounts_consent(
        &self,
        permissions: Vec<String>,
        client_id: &str,
        bank: &str,
        reason: &str,
    ) -> Result<String, AppError> {
        let consent = AccountConsent {
            client_id: client_id.to_string(),
            permissions,
            reason: reason.to_string(),
            requesting_bank: bank.to_string(),
            requesting_bank_name: String::new(),
            status: String::new(),
            consent_id: String::new(),
            auto_approved: false,
            consent_provider: String::new(),
        };
        let stored = self.request_and_store(bank, consent).await?;
        Ok(stored.consent_id)
    }

    async fn request_and_store(
        &self,
        provider: &str,
        mut consent: AccountConsent,
    ) -> Result<AccountConsent, AppError> {
        let response = self.request_consent(provider, &consent).await?;
        consent.apply_response(response, provider);
        self.store.save_consent(&consent).await?;
        tracing::info!(
            provider = %provider,
            consent_id = %consent.consent_id,
            status = %consent.status,
            "consent stored"
        );
        Ok(consent)
    }

    async fn request_consent(
        &self,
        provider: &str,
        consent: &AccountConsent,
    ) -> Result<ConsentResponse, AppError> {
        let token = self.tokens.token(provider).await?;
        let endpoints = self.providers.endpoints(provider)?;
        let mut url = endpoints.api_url.clone();
        url.set_path("/account-consents/request");

        tracing::debug!(provider = %provider, "requesting consent");
        let response = self
            .http
            .post(url)
            .header("Authorization", token.authorization())
            .header("X-Requesting-Bank", &consent.requesting_bank)
            .json(&ConsentRequestBody::from_consent(consent))
            .send()
            .await
            .map_err(|e| AppError::ConsentRequest {
                provider: provider.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ConsentRequest {
                provider: provider.to_string(),
                reason: format!("consent endpoint returned {}", status),
            });
        }

        response.json().await.map_err(|e| AppError::ConsentRequest {
            provider: provider.to_string(),
            reason: format!("undecodable consent payload: {}", e),
        })
    }
}
