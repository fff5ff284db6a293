//! Client-credentials token issuance with per-provider caching.
//!
//! Tokens are cached under the provider name for a fixed TTL window
//! (default 24 h), regardless of the `expires_in` the provider advertises.
//! There is no proactive refresh: expiry is discovered on the next call once
//! the cache entry has aged out, and a provider-side early revocation only
//! surfaces when a downstream call fails.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::Providers;
use crate::errors::AppError;
use crate::models::token::CachedToken;

#[derive(Clone)]
pub struct TokenService {
    providers: Arc<Providers>,
    cache: TtlCache,
    http: reqwest::Client,
    token_ttl: Duration,
}

impl TokenService {
    pub fn new(
        providers: Arc<Providers>,
        cache: TtlCache,
        http: reqwest::Client,
        token_ttl: Duration,
    ) -> Self {
        Self {
            providers,
            cache,
            http,
            token_ttl,
        }
    }

    /// Return a valid access token for `provider_name`.
    ///
    /// Cache hit is the common, no-I/O path. On a miss the provider's token
    /// endpoint is called once — transport failures and non-2xx statuses are
    /// surfaced without retry.
    pub async fn token(&self, provider_name: &str) -> Result<CachedToken, AppError> {
        if let Some(token) = self.cache.get::<CachedToken>(provider_name) {
            return Ok(token);
        }

        let endpoints = self.providers.endpoints(provider_name)?;
        let mut token_url = endpoints.token_url.clone();
        token_url
            .query_pairs_mut()
            .append_pair("client_id", self.providers.client_id())
            .append_pair("client_secret", self.providers.client_secret());

        tracing::debug!(provider = %provider_name, "exchanging client credentials");
        let response = self
            .http
            .post(token_url)
            .send()
            .await
            .map_err(|e| AppError::TokenExchange {
                provider: provider_name.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TokenExchange {
                provider: provider_name.to_string(),
                reason: format!("token endpoint returned {}", status),
            });
        }

        let token: CachedToken =
            response.json().await.map_err(|e| AppError::TokenExchange {
                provider: provider_name.to_string(),
                reason: format!("undecodable token payload: {}", e),
            })?;

        if let Err(e) = self
            .cache
            .set_with_expiration(provider_name, &token, self.token_ttl)
        {
            // A stale-cache miss next time is acceptable; the token itself is good.
            tracing::warn!(provider = %provider_name, "failed to cache token: {}", e);
        }
        Ok(token)
    }
}
