//! Account aggregation across all of a client's active consents.
//!
//! Pending consents (and consents the provider never assigned an id to) are
//! skipped, not errors. Fetches fan out one task per active consent and the
//! whole aggregation fails on the first provider failure, mirroring the
//! consent batch semantics.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::Providers;
use crate::errors::AppError;
use crate::models::account::{Account, AccountsResponse};
use crate::models::consent::AccountConsent;
use crate::oauth::TokenService;
use crate::store::{AccountStore, ConsentStore};

#[derive(Clone)]
pub struct AccountService {
    tokens: TokenService,
    providers: Arc<Providers>,
    consents: Arc<dyn ConsentStore>,
    accounts: Arc<dyn AccountStore>,
    http: reqwest::Client,
}

impl AccountService {
    pub fn new(
        tokens: TokenService,
        providers: Arc<Providers>,
        consents: Arc<dyn ConsentStore>,
        accounts: Arc<dyn AccountStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            tokens,
            providers,
            consents,
            accounts,
            http,
        }
    }

    /// Fetch and merge the account lists of every provider the client holds
    /// an active consent for, then upsert each account.
    ///
    /// The returned list may include accounts already stored by a prior
    /// aggregation; deduplication happens only at the storage upsert key.
    pub async fn aggregate_accounts(&self, client_id: &str) -> Result<Vec<Account>, AppError> {
        let consents = self.consents.get_consents(client_id).await?;

        let mut tasks = JoinSet::new();
        for consent in consents.into_iter().filter(|c| c.is_active()) {
            let svc = self.clone();
            let client_id = client_id.to_string();
            tasks.spawn(async move { svc.fetch_provider_accounts(&consent, &client_id).await });
        }

        let mut merged = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(accounts)) => merged.extend(accounts),
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(AppError::Internal(anyhow::anyhow!(
                        "account fetch task did not complete: {e}"
                    )));
                }
            }
        }

        for account in &merged {
            self.accounts.save_account(account).await?;
        }
        tracing::info!(client_id = %client_id, count = merged.len(), "accounts aggregated");
        Ok(merged)
    }

    async fn fetch_provider_accounts(
        &self,
        consent: &AccountConsent,
        client_id: &str,
    ) -> Result<Vec<Account>, AppError> {
        let provider = consent.consent_provider.as_str();
        let token = self.tokens.token(provider).await?;
        let endpoints = self.providers.endpoints(provider)?;
        let mut url = endpoints.api_url.clone();
        url.set_path("/accounts");
        url.query_pairs_mut().append_pair("client_id", client_id);

        tracing::debug!(provider = %provider, "fetching accounts");
        let response = self
            .http
            .get(url)
            .header("Authorization", token.authorization())
            .header("X-Requesting-Bank", &consent.requesting_bank)
            .header("X-Consent-Id", &consent.consent_id)
            .send()
            .await
            .map_err(|e| AppError::AccountFetch {
                provider: provider.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::AccountFetch {
                provider: provider.to_string(),
                reason: format!("accounts endpoint returned {}", status),
            });
        }

        let payload: AccountsResponse =
            response.json().await.map_err(|e| AppError::AccountFetch {
                provider: provider.to_string(),
                reason: format!("undecodable accounts payload: {}", e),
            })?;
        Ok(payload.data.account)
    }
}
