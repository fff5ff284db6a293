//! Shared fixtures for the integration tests: in-memory store fakes and
//! wiremock-backed provider registries.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bankagg::aggregator::AccountService;
use bankagg::cache::TtlCache;
use bankagg::config::{ProviderEntry, Providers};
use bankagg::consents::ConsentService;
use bankagg::errors::AppError;
use bankagg::models::account::Account;
use bankagg::models::consent::AccountConsent;
use bankagg::oauth::TokenService;
use bankagg::store::{AccountStore, ConsentStore};

/// In-memory store fake. Upserts consents by `consent_id` and accounts by
/// `account_id`, mirroring the Postgres contract.
#[derive(Default)]
pub struct MemoryStore {
    pub consents: Mutex<Vec<AccountConsent>>,
    pub accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryStore {
    pub fn consents_snapshot(&self) -> Vec<AccountConsent> {
        self.consents.lock().unwrap().clone()
    }

    pub fn accounts_snapshot(&self) -> HashMap<String, Account> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn seed_consent(&self, consent: AccountConsent) {
        self.consents.lock().unwrap().push(consent);
    }
}

#[async_trait]
impl ConsentStore for MemoryStore {
    async fn save_consent(&self, consent: &AccountConsent) -> Result<(), AppError> {
        let mut consents = self.consents.lock().unwrap();
        match consents
            .iter_mut()
            .find(|stored| stored.consent_id == consent.consent_id)
        {
            Some(stored) => *stored = consent.clone(),
            None => consents.push(consent.clone()),
        }
        Ok(())
    }

    async fn update_consent(&self, consent: &AccountConsent) -> Result<(), AppError> {
        let mut consents = self.consents.lock().unwrap();
        for stored in consents.iter_mut() {
            if stored.consent_id == consent.consent_id {
                *stored = consent.clone();
            }
        }
        Ok(())
    }

    async fn get_consents(&self, client_id: &str) -> Result<Vec<AccountConsent>, AppError> {
        Ok(self
            .consents
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.client_id == client_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn save_account(&self, account: &Account) -> Result<(), AppError> {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }
}

/// Store fake whose writes always fail, for persistence-error paths.
pub struct FailingConsentStore;

#[async_trait]
impl ConsentStore for FailingConsentStore {
    async fn save_consent(&self, _consent: &AccountConsent) -> Result<(), AppError> {
        Err(AppError::Persistence {
            source: sqlx::Error::PoolTimedOut,
            rollback: None,
        })
    }

    async fn update_consent(&self, _consent: &AccountConsent) -> Result<(), AppError> {
        Err(AppError::Persistence {
            source: sqlx::Error::PoolTimedOut,
            rollback: None,
        })
    }

    async fn get_consents(&self, _client_id: &str) -> Result<Vec<AccountConsent>, AppError> {
        Err(AppError::Persistence {
            source: sqlx::Error::PoolTimedOut,
            rollback: None,
        })
    }
}

/// Registry whose token and API endpoints all point at one mock server.
/// Providers are told apart by token path and the `X-Requesting-Bank`
/// header, since they share the server.
pub fn providers_for(mock: &MockServer, names: &[&str]) -> Arc<Providers> {
    let entries = names
        .iter()
        .map(|name| ProviderEntry {
            name: (*name).to_string(),
            token_url: format!("{}/token/{}", mock.uri(), name),
            api_url: Some(mock.uri()),
        })
        .collect();
    Arc::new(Providers::from_entries("cid".into(), "shh".into(), "example.org", entries).unwrap())
}

/// Mount a client-credentials endpoint answering `tok-{name}`.
pub async fn mount_token_endpoint(mock: &MockServer, name: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/token/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": format!("tok-{name}"),
            "token_type": "Bearer",
            "expires_in": 600
        })))
        .mount(mock)
        .await;
}

pub fn token_service(providers: Arc<Providers>) -> TokenService {
    TokenService::new(
        providers,
        TtlCache::new(64, 64),
        reqwest::Client::new(),
        Duration::from_secs(3600),
    )
}

pub fn consent_service(providers: Arc<Providers>, store: Arc<dyn ConsentStore>) -> ConsentService {
    ConsentService::new(
        token_service(providers.clone()),
        providers,
        store,
        reqwest::Client::new(),
    )
}

pub fn account_service(
    providers: Arc<Providers>,
    consents: Arc<dyn ConsentStore>,
    accounts: Arc<dyn AccountStore>,
) -> AccountService {
    AccountService::new(
        token_service(providers.clone()),
        providers,
        consents,
        accounts,
        reqwest::Client::new(),
    )
}

pub fn consent_for(client_id: &str, bank: &str) -> AccountConsent {
    AccountConsent {
        client_id: client_id.to_string(),
        permissions: vec!["ReadAccountsBasic".into(), "ReadBalances".into()],
        reason: "personal finance aggregation".into(),
        requesting_bank: bank.to_string(),
        requesting_bank_name: format!("{bank} JSC"),
        status: String::new(),
        consent_id: String::new(),
        auto_approved: false,
        consent_provider: String::new(),
    }
}
