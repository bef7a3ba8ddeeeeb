//! Transaction history fetching for a single address.
//!
//! Walks the Helius transaction history backwards with the `before` cursor
//! until the history runs out or the per-address ceiling is reached.

use crate::address::Address;
use crate::client::{ApiError, HeliusClient};
use crate::schemas::TransactionRecord;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Largest page the transactions endpoint serves.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch transactions for {address} after {pages_fetched} page(s): {source}")]
    Api {
        address: String,
        pages_fetched: usize,
        #[source]
        source: ApiError,
    },
}

/// Paginating transaction fetcher
pub struct TransactionFetcher {
    client: Arc<HeliusClient>,
}

impl TransactionFetcher {
    pub fn new(client: Arc<HeliusClient>) -> Self {
        Self { client }
    }

    /// Fetch up to `max_total` transactions for `address`, newest first.
    ///
    /// Any API failure aborts the fetch for this address; records from pages
    /// already received are discarded.
    pub async fn fetch_transactions(
        &self,
        address: &Address,
        max_total: usize,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        let page_size = max_total.min(MAX_PAGE_SIZE);
        if page_size == 0 {
            return Ok(Vec::new());
        }

        let mut all_transactions: Vec<TransactionRecord> = Vec::new();
        let mut before: Option<String> = None;
        let mut pages_fetched = 0usize;

        loop {
            debug!(
                "Fetching batch {} for {} (page size {})",
                pages_fetched + 1,
                address,
                page_size
            );

            let page = self
                .client
                .get_transactions_page(address, page_size, before.as_deref())
                .await
                .map_err(|source| FetchError::Api {
                    address: address.to_string(),
                    pages_fetched,
                    source,
                })?;
            pages_fetched += 1;

            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            let cursor = page.last().and_then(|tx| tx.signature.clone());
            all_transactions.extend(page);
            debug!(
                "Found {} transactions in this batch ({} so far)",
                page_len,
                all_transactions.len()
            );

            if all_transactions.len() >= max_total {
                all_transactions.truncate(max_total);
                break;
            }

            if page_len < page_size {
                break;
            }

            match cursor {
                Some(signature) => before = Some(signature),
                None => {
                    warn!(
                        "Last transaction of page {} for {} has no signature; cannot paginate further",
                        pages_fetched, address
                    );
                    break;
                }
            }
        }

        info!(
            "Fetched {} transactions for {} in {} page(s)",
            all_transactions.len(),
            address,
            pages_fetched
        );

        Ok(all_transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Commitment, RateLimitConfig};
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "WalletA";

    fn fetcher(server: &MockServer) -> TransactionFetcher {
        let client = HeliusClient::new(
            server.uri(),
            "test-key".to_string(),
            Commitment::Confirmed,
            RateLimitConfig {
                requests_per_second: 1000,
                request_timeout_secs: 5,
            },
        )
        .unwrap();
        TransactionFetcher::new(Arc::new(client))
    }

    fn page(page_index: usize, len: usize) -> Value {
        Value::Array(
            (0..len)
                .map(|i| {
                    json!({
                        "signature": format!("p{}-{}", page_index, i),
                        "timestamp": 1_700_000_000 - (page_index * 1000 + i) as i64,
                    })
                })
                .collect(),
        )
    }

    /// Mount page `index` so that it is served for the cursor left by page `index - 1`.
    async fn mount_page(server: &MockServer, index: usize, len: usize, limit: &str, times: u64) {
        let mock = Mock::given(method("GET"))
            .and(path(format!("/addresses/{}/transactions", ADDRESS)))
            .and(query_param("limit", limit));
        let mock = if index == 0 {
            mock.and(query_param_is_missing("before"))
        } else {
            mock.and(query_param("before", format!("p{}-{}", index - 1, 99).as_str()))
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(page(index, len)))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_partial_page_ends_history() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 100, "100", 1).await;
        mount_page(&server, 1, 100, "100", 1).await;
        mount_page(&server, 2, 40, "100", 1).await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server)
            .fetch_transactions(&address, 1000)
            .await
            .unwrap();

        assert_eq!(txs.len(), 240);
        assert_eq!(txs[0].signature.as_deref(), Some("p0-0"));
        assert_eq!(txs[239].signature.as_deref(), Some("p2-39"));
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_on_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 100, "100", 1).await;
        mount_page(&server, 1, 100, "100", 1).await;
        mount_page(&server, 2, 0, "100", 1).await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server)
            .fetch_transactions(&address, 1000)
            .await
            .unwrap();

        assert_eq!(txs.len(), 200);
        assert_eq!(txs[199].signature.as_deref(), Some("p1-99"));
    }

    #[tokio::test]
    async fn test_non_object_entry_keeps_rest_of_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/addresses/{}/transactions", ADDRESS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "signature": "good",
                    "timestamp": 1_700_000_000,
                    "nativeTransfers": [{"fromUserAccount": ADDRESS, "toUserAccount": "WalletB", "amount": 5}]
                },
                null
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server)
            .fetch_transactions(&address, 1000)
            .await
            .unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].signature.as_deref(), Some("good"));
        assert_eq!(txs[0].native_transfers.as_ref().map(Vec::len), Some(1));
        assert_eq!(txs[1].signature, None);
    }

    #[tokio::test]
    async fn test_non_object_entry_does_not_end_pagination() {
        let server = MockServer::start().await;

        let mut first = page(0, 100);
        first[50] = Value::Null;
        Mock::given(method("GET"))
            .and(query_param_is_missing("before"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first))
            .expect(1)
            .mount(&server)
            .await;
        mount_page(&server, 1, 10, "100", 1).await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server)
            .fetch_transactions(&address, 1000)
            .await
            .unwrap();

        assert_eq!(txs.len(), 110);
        assert_eq!(txs[50].signature, None);
        assert_eq!(txs[109].signature.as_deref(), Some("p1-9"));
    }

    #[tokio::test]
    async fn test_truncates_to_max_total() {
        let server = MockServer::start().await;
        for index in 0..3 {
            mount_page(&server, index, 100, "100", 1).await;
        }
        // Pages beyond the cap must never be requested
        for index in 3..10 {
            mount_page(&server, index, 100, "100", 0).await;
        }

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server)
            .fetch_transactions(&address, 250)
            .await
            .unwrap();

        assert_eq!(txs.len(), 250);
        assert_eq!(txs[249].signature.as_deref(), Some("p2-49"));
    }

    #[tokio::test]
    async fn test_small_cap_shrinks_page_size() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/addresses/{}/transactions", ADDRESS)))
            .and(query_param("limit", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 30)))
            .expect(1)
            .mount(&server)
            .await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server).fetch_transactions(&address, 30).await.unwrap();
        assert_eq!(txs.len(), 30);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server).fetch_transactions(&address, 1000).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn test_zero_cap_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 10)))
            .expect(0)
            .mount(&server)
            .await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server).fetch_transactions(&address, 0).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn test_failure_discards_earlier_pages() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 100, "100", 1).await;

        Mock::given(method("GET"))
            .and(query_param("before", "p0-99"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let address = Address::parse(ADDRESS).unwrap();
        let err = fetcher(&server)
            .fetch_transactions(&address, 1000)
            .await
            .unwrap_err();

        match err {
            FetchError::Api {
                address,
                pages_fetched,
                source: ApiError::Status { status, .. },
            } => {
                assert_eq!(address, ADDRESS);
                assert_eq!(pages_fetched, 1);
                assert_eq!(status, 500);
            }
            e => panic!("Expected status failure, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_missing_cursor_stops_pagination() {
        let server = MockServer::start().await;

        let mut records = page(0, 100);
        records[99]["signature"] = Value::Null;

        Mock::given(method("GET"))
            .and(query_param_is_missing("before"))
            .respond_with(ResponseTemplate::new(200).set_body_json(records))
            .expect(1)
            .mount(&server)
            .await;

        let address = Address::parse(ADDRESS).unwrap();
        let txs = fetcher(&server).fetch_transactions(&address, 1000).await.unwrap();
        assert_eq!(txs.len(), 100);
    }
}
