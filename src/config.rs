use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Fixed wall-clock TTL for cached provider tokens, in seconds.
    /// Deliberately independent of each token's own `expires_in` hint.
    pub token_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub cache_initial_capacity: usize,
    /// Path to the YAML provider registry.
    pub providers_file: String,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    Ok(Config {
        port: std::env::var("BANKAGG_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/bankagg".into()),
        token_ttl_secs: std::env::var("BANKAGG_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400),
        cache_max_entries: std::env::var("BANKAGG_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024),
        cache_initial_capacity: std::env::var("BANKAGG_CACHE_INITIAL_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(64),
        providers_file: std::env::var("BANKAGG_PROVIDERS_FILE")
            .unwrap_or_else(|_| "providers.yaml".into()),
    })
}

// ── Provider registry ────────────────────────────────────────

/// One entry of the YAML provider registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    /// Client-credentials token endpoint for this provider.
    pub token_url: String,
    /// Business API base. Defaults to `https://{name}.{provider_domain}`.
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProvidersFile {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_provider_domain")]
    provider_domain: String,
    providers: Vec<ProviderEntry>,
}

fn default_provider_domain() -> String {
    "open.bankingapi.ru".to_string()
}

/// Resolved endpoints for one registered provider.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub token_url: Url,
    pub api_url: Url,
}

/// Registered providers plus the service-wide OAuth2 client credentials.
#[derive(Debug, Clone)]
pub struct Providers {
    client_id: String,
    client_secret: String,
    entries: HashMap<String, ProviderEndpoints>,
}

impl Providers {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let file: ProvidersFile = serde_yaml::from_slice(&bytes)?;
        Self::from_entries(
            file.client_id,
            file.client_secret,
            &file.provider_domain,
            file.providers,
        )
    }

    /// Build the registry, deriving each missing `api_url` from the provider
    /// name. Duplicate provider names are rejected.
    pub fn from_entries(
        client_id: String,
        client_secret: String,
        provider_domain: &str,
        providers: Vec<ProviderEntry>,
    ) -> anyhow::Result<Self> {
        let mut entries = HashMap::with_capacity(providers.len());
        for provider in providers {
            let token_url = Url::parse(&provider.token_url)?;
            let api_url = match &provider.api_url {
                Some(url) => Url::parse(url)?,
                None => Url::parse(&format!("https://{}.{}", provider.name, provider_domain))?,
            };
            if entries
                .insert(provider.name.clone(), ProviderEndpoints { token_url, api_url })
                .is_some()
            {
                anyhow::bail!("duplicate provider in registry: {}", provider.name);
            }
        }
        Ok(Self {
            client_id,
            client_secret,
            entries,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn endpoints(&self, name: &str) -> Result<&ProviderEndpoints, AppError> {
        self.entries
            .get(name)
            .ok_or_else(|| AppError::ProviderNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
