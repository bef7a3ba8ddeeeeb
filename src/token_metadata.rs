//! Token metadata lookup with a bounded in-memory cache.
//!
//! Lookups are best-effort: failures are logged and reported as `None`, and
//! negative answers are not cached so a later call asks the API again.

use crate::client::HeliusClient;
use crate::schemas::TokenMetadata;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct TokenMetadataResolver {
    client: Arc<HeliusClient>,
    cache: Mutex<LruCache<String, TokenMetadata>>,
}

impl TokenMetadataResolver {
    pub fn new(client: Arc<HeliusClient>, capacity: NonZeroUsize) -> Self {
        Self {
            client,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Metadata for `mint`, from cache when possible.
    pub async fn resolve(&self, mint: &str) -> Option<TokenMetadata> {
        if let Some(hit) = self.cache.lock().await.get(mint).cloned() {
            debug!("Token metadata cache hit for {}", mint);
            return Some(hit);
        }

        let records = match self.client.get_token_metadata(&[mint]).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Error fetching token info for {}: {}", mint, e);
                return None;
            }
        };

        let metadata = records.into_iter().next()?;
        self.cache
            .lock()
            .await
            .put(mint.to_string(), metadata.clone());
        Some(metadata)
    }

    /// Resolve several mints in order, dropping the ones that fail.
    pub async fn resolve_many(&self, mints: &[String]) -> Vec<(String, TokenMetadata)> {
        let mut resolved = Vec::with_capacity(mints.len());
        for mint in mints {
            if let Some(metadata) = self.resolve(mint).await {
                resolved.push((mint.clone(), metadata));
            }
        }
        resolved
    }

    /// Number of cached entries
    pub async fn cached(&self) -> usize {
        self.cache.lock().await.len()
    }
}
