//! Helius REST client with client-side rate limiting.
//!
//! Wraps the two endpoints the scanner needs:
//! - enhanced transaction history per address (cursor paginated)
//! - token metadata by mint
//!
//! Requests are never retried: a failed call is handed straight back to the
//! caller, which decides how much of the scan it invalidates.

use crate::address::Address;
use crate::config::{Commitment, RateLimitConfig};
use crate::schemas::{TokenMetadata, TransactionRecord};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Body of a token-metadata request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenMetadataRequest<'a> {
    mint_accounts: &'a [&'a str],
}

/// Rate-limited Helius API client.
pub struct HeliusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    commitment: Commitment,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl HeliusClient {
    pub fn new(
        base_url: String,
        api_key: String,
        commitment: Commitment,
        config: RateLimitConfig,
    ) -> Result<Self, ApiError> {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        );
        let rate_limiter = RateLimiter::direct(quota);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            commitment,
            rate_limiter,
        })
    }

    /// Fetch one page of enhanced transactions for `address`, newest first.
    ///
    /// `before` is the signature of the last record of the previous page.
    /// An empty page means the history is exhausted.
    pub async fn get_transactions_page(
        &self,
        address: &Address,
        limit: usize,
        before: Option<&str>,
    ) -> Result<Vec<TransactionRecord>, ApiError> {
        let url = format!("{}/addresses/{}/transactions", self.base_url, address);

        let mut query: Vec<(&str, String)> = vec![
            ("api-key", self.api_key.clone()),
            ("limit", limit.to_string()),
            ("commitment", self.commitment.to_string()),
        ];
        if let Some(cursor) = before {
            query.push(("before", cursor.to_string()));
        }

        self.rate_limiter.until_ready().await;
        debug!(
            "GET transactions for {} (limit={}, before={:?})",
            address, limit, before
        );

        let response = self.client.get(&url).query(&query).send().await?;
        let page: Vec<Value> = Self::decode(response).await?;
        Ok(page.into_iter().map(TransactionRecord::from_json).collect())
    }

    /// Fetch metadata for a batch of mint addresses.
    pub async fn get_token_metadata(&self, mints: &[&str]) -> Result<Vec<TokenMetadata>, ApiError> {
        let url = format!("{}/token-metadata", self.base_url);

        self.rate_limiter.until_ready().await;
        debug!("POST token-metadata for {} mint(s)", mints.len());

        let response = self
            .client
            .post(&url)
            .query(&[("api-key", self.api_key.as_str())])
            .json(&TokenMetadataRequest {
                mint_accounts: mints,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        if !status.is_success() {
            // Keep the body: Helius explains rejected keys and bad cursors there
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
