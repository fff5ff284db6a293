use serde::{Deserialize, Serialize};

/// A bank account visible under an active consent.
///
/// `account_id` is the provider-assigned natural key; re-aggregation upserts
/// by it, overwriting the mutable fields. Wire names follow the provider
/// payload (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(default)]
    pub currency: String,
    #[serde(rename = "accountType", default)]
    pub account_type: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub servicer: String,
}

/// Envelope of the provider `GET /accounts` response:
/// `{"data": {"account": [...]}}`.
#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    pub data: AccountsData,
}

#[derive(Debug, Deserialize)]
pub struct AccountsData {
    #[serde(default)]
    pub account: Vec<Account>,
}
