pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::account::Account;
use crate::models::consent::AccountConsent;

/// Persistence capability for consents. Narrow on purpose so tests can
/// substitute an in-memory fake.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Insert a consent record. Re-saving the same `consent_id` overwrites
    /// the stored row, so a re-invoked batch never trips over consents its
    /// failed predecessor already persisted.
    async fn save_consent(&self, consent: &AccountConsent) -> Result<(), AppError>;

    /// Full-row update keyed by the provider-assigned consent id.
    async fn update_consent(&self, consent: &AccountConsent) -> Result<(), AppError>;

    /// All stored consents for a client, pending ones included.
    async fn get_consents(&self, client_id: &str) -> Result<Vec<AccountConsent>, AppError>;
}

/// Persistence capability for accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert-or-update keyed by `account_id`, overwriting mutable fields.
    async fn save_account(&self, account: &Account) -> Result<(), AppError>;
}
