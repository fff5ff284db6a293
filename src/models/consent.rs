use serde::{Deserialize, Serialize};

/// One provider's grant of account-data access for a client.
///
/// Built client-side from the incoming request; the provider-assigned fields
/// (`status`, `consent_id`, `auto_approved`) stay empty/default until the
/// provider responds. A consent with a non-empty `consent_id` and a status
/// other than `"pending"` is active and usable for account retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConsent {
    pub client_id: String,
    pub permissions: Vec<String>,
    pub reason: String,
    pub requesting_bank: String,
    #[serde(default)]
    pub requesting_bank_name: String,
    /// Free-form provider status. `"pending"` means not yet usable.
    #[serde(default)]
    pub status: String,
    /// Provider-assigned identifier, empty until the consent response arrives.
    #[serde(default)]
    pub consent_id: String,
    #[serde(default)]
    pub auto_approved: bool,
    /// Name of the provider that satisfied this consent. Equals
    /// `requesting_bank` in the single-consent flow.
    #[serde(default)]
    pub consent_provider: String,
}

impl AccountConsent {
    /// Whether this consent can be used to fetch accounts.
    pub fn is_active(&self) -> bool {
        !self.consent_id.is_empty() && self.status != "pending"
    }
}

/// Body of `POST /account-consents/request` sent to a provider.
#[derive(Debug, Serialize)]
pub struct ConsentRequestBody<'a> {
    pub client_id: &'a str,
    pub permissions: &'a [String],
    pub reason: &'a str,
    pub requesting_bank: &'a str,
    pub requesting_bank_name: &'a str,
}

impl<'a> ConsentRequestBody<'a> {
    pub fn from_consent(consent: &'a AccountConsent) -> Self {
        Self {
            client_id: &consent.client_id,
            permissions: &consent.permissions,
            reason: &consent.reason,
            requesting_bank: &consent.requesting_bank,
            requesting_bank_name: &consent.requesting_bank_name,
        }
    }
}

/// Provider response to a consent request.
#[derive(Debug, Deserialize)]
pub struct ConsentResponse {
    pub status: String,
    pub consent_id: String,
    #[serde(default)]
    pub auto_approved: bool,
}

impl AccountConsent {
    /// Apply the provider-assigned fields from a consent response.
    pub fn apply_response(&mut self, resp: ConsentResponse, provider: &str) {
        self.status = resp.status;
        self.consent_id = resp.consent_id;
        self.auto_approved = resp.auto_approved;
        self.consent_provider = provider.to_string();
    }
}
