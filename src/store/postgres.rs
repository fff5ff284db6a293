use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::errors::AppError;
use crate::models::account::Account;
use crate::models::consent::AccountConsent;
use crate::store::{AccountStore, ConsentStore};

/// sqlx-backed store. Every operation runs in one explicit transaction;
/// reads rely on the Postgres read-committed default.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Roll back after `source` and surface both errors if the rollback itself
/// fails too.
async fn fail_with_rollback(
    tx: Transaction<'_, Postgres>,
    source: sqlx::Error,
) -> AppError {
    match tx.rollback().await {
        Ok(()) => AppError::Persistence {
            source,
            rollback: None,
        },
        Err(rollback) => {
            tracing::error!("failed to roll back transaction: {}", rollback);
            AppError::Persistence {
                source,
                rollback: Some(rollback),
            }
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConsentRow {
    client_id: String,
    permissions: Vec<String>,
    reason: String,
    requesting_bank: String,
    requesting_bank_name: String,
    status: String,
    consent_id: String,
    auto_approved: bool,
    consent_provider: String,
}

impl From<ConsentRow> for AccountConsent {
    fn from(row: ConsentRow) -> Self {
        AccountConsent {
            client_id: row.client_id,
            permissions: row.permissions,
            reason: row.reason,
            requesting_bank: row.requesting_bank,
            requesting_bank_name: row.requesting_bank_name,
            status: row.status,
            consent_id: row.consent_id,
            auto_approved: row.auto_approved,
            consent_provider: row.consent_provider,
        }
    }
}

#[async_trait]
impl ConsentStore for PgStore {
    async fn save_consent(&self, consent: &AccountConsent) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"INSERT INTO consents
               (client_id, permissions, reason, requesting_bank, requesting_bank_name,
                status, consent_id, auto_approved, consent_provider)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (consent_id) DO UPDATE SET
                   client_id = EXCLUDED.client_id,
                   permissions = EXCLUDED.permissions,
                   reason = EXCLUDED.reason,
                   requesting_bank = EXCLUDED.requesting_bank,
                   requesting_bank_name = EXCLUDED.requesting_bank_name,
                   status = EXCLUDED.status,
                   auto_approved = EXCLUDED.auto_approved,
                   consent_provider = EXCLUDED.consent_provider,
                   updated_at = NOW()"#,
        )
        .bind(&consent.client_id)
        .bind(&consent.permissions)
        .bind(&consent.reason)
        .bind(&consent.requesting_bank)
        .bind(&consent.requesting_bank_name)
        .bind(&consent.status)
        .bind(&consent.consent_id)
        .bind(consent.auto_approved)
        .bind(&consent.consent_provider)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => Err(fail_with_rollback(tx, e).await),
        }
    }

    async fn update_consent(&self, consent: &AccountConsent) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"UPDATE consents SET
               client_id = $2,
               permissions = $3,
               reason = $4,
               requesting_bank = $5,
               requesting_bank_name = $6,
               status = $7,
               auto_approved = $8,
               consent_provider = $9,
               updated_at = NOW()
               WHERE consent_id = $1"#,
        )
        .bind(&consent.consent_id)
        .bind(&consent.client_id)
        .bind(&consent.permissions)
        .bind(&consent.reason)
        .bind(&consent.requesting_bank)
        .bind(&consent.requesting_bank_name)
        .bind(&consent.status)
        .bind(consent.auto_approved)
        .bind(&consent.consent_provider)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => Err(fail_with_rollback(tx, e).await),
        }
    }

    async fn get_consents(&self, client_id: &str) -> Result<Vec<AccountConsent>, AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query_as::<_, ConsentRow>(
            r#"SELECT client_id, permissions, reason, requesting_bank,
                      requesting_bank_name, status, consent_id, auto_approved,
                      consent_provider
               FROM consents WHERE client_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await;

        match result {
            Ok(rows) => {
                tx.commit().await?;
                Ok(rows.into_iter().map(AccountConsent::from).collect())
            }
            Err(e) => Err(fail_with_rollback(tx, e).await),
        }
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn save_account(&self, account: &Account) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"INSERT INTO accounts (account_id, currency, account_type, nickname, servicer)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (account_id) DO UPDATE SET
                   currency = EXCLUDED.currency,
                   account_type = EXCLUDED.account_type,
                   nickname = EXCLUDED.nickname,
                   servicer = EXCLUDED.servicer,
                   updated_at = NOW()"#,
        )
        .bind(&account.account_id)
        .bind(&account.currency)
        .bind(&account.account_type)
        .bind(&account.nickname)
        .bind(&account.servicer)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => Err(fail_with_rollback(tx, e).await),
        }
    }
}
