use serde_json::json;
use sol_transfer_scanner::address::Address;
use sol_transfer_scanner::aggregate::render_report;
use sol_transfer_scanner::config::ScannerConfig;
use sol_transfer_scanner::scan::Scanner;
use sol_transfer_scanner::TransferKind;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const A: &str = "7C3o6iK4sNfB2ewc2ExRVPjRttQVBXdMZKXy6u6bh3DF";
const B: &str = "H5kdkDUfT5umYbRxFKpWkgveeNWf1EcqUgBT7EdRmeij";
const C: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

fn scanner(server: &MockServer) -> Scanner {
    let mut config = ScannerConfig::with_api_key("test-api-key");
    config.helius_base_url = server.uri();
    config.rate_limits.requests_per_second = 1000;
    Scanner::from_config(&config).unwrap()
}

fn history_path(address: &str) -> String {
    format!("/addresses/{}/transactions", address)
}

#[tokio::test]
async fn test_scan_merges_both_histories() {
    let server = MockServer::start().await;

    let shared = json!({
        "signature": "shared",
        "timestamp": 1_700_000_300,
        "nativeTransfers": [{"fromUserAccount": A, "toUserAccount": B, "amount": 1_500_000_000u64}]
    });

    Mock::given(method("GET"))
        .and(path(history_path(A)))
        .and(query_param("api-key", "test-api-key"))
        .and(query_param("commitment", "confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shared.clone(),
            {
                "signature": "unrelated",
                "timestamp": 1_700_000_200,
                "nativeTransfers": [{"fromUserAccount": A, "toUserAccount": C, "amount": 5}]
            },
            {
                "signature": "old-native",
                "timestamp": 1_700_000_000,
                "nativeTransfers": [{"fromUserAccount": B, "toUserAccount": A, "amount": 250_000_000u64}]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(history_path(B)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "signature": "token",
                "timestamp": 1_700_000_400,
                "tokenTransfers": [{
                    "fromUserAccount": B,
                    "toUserAccount": A,
                    "tokenAmount": 2500,
                    "decimals": 2,
                    "tokenStandard": "Fungible"
                }]
            },
            shared
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let a = Address::parse(A).unwrap();
    let b = Address::parse(B).unwrap();
    let result = scanner(&server).scan(&a, &b, 1000).await;

    let signatures: Vec<&str> = result.events.iter().map(|e| e.signature.as_str()).collect();
    assert_eq!(signatures, vec!["token", "shared", "old-native"]);
    assert!(result.fetch_errors.is_empty());

    assert_eq!(result.events[0].kind, TransferKind::Token);
    assert_eq!(result.events[0].amount, 25.0);
    assert_eq!(result.stats.native.count, 2);
    assert_eq!(result.stats.native.volume, 1.75);
    assert_eq!(result.stats.tokens["Fungible"].count, 1);

    let mut report = Vec::new();
    render_report(&result, &mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.starts_with("Found 3 transfers between addresses:"));
    assert!(report.contains("  Volume: 1.7500 SOL"));
}

#[tokio::test]
async fn test_scan_survives_one_failed_address() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(history_path(A)))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(history_path(B)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "signature": "from-b",
                "timestamp": 42,
                "nativeTransfers": [{"fromUserAccount": B, "toUserAccount": A, "amount": 1_000_000_000u64}]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let a = Address::parse(A).unwrap();
    let b = Address::parse(B).unwrap();
    let result = scanner(&server).scan(&a, &b, 1000).await;

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.fetch_errors.len(), 1);
    assert_eq!(result.fetch_errors[0].address, A);
    assert!(result.fetch_errors[0].error.contains("429"));
}

#[tokio::test]
async fn test_scan_with_no_shared_transfers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let a = Address::parse(A).unwrap();
    let b = Address::parse(B).unwrap();
    let result = scanner(&server).scan(&a, &b, 1000).await;

    assert!(result.events.is_empty());
    assert!(result.fetch_errors.is_empty());

    let mut report = Vec::new();
    render_report(&result, &mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.contains("Count: 0"));
    assert!(report.contains("Volume: 0.0000 SOL"));
    assert!(!report.contains("SPL Token Transfers"));
}
