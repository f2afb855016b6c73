use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use solana_wallet_monitor::core::discovery::{discover, discover_since};
use solana_wallet_monitor::{
    RpcClient, ScanMode, WalletMonitorConfig, WalletMonitorConfigBuilder, WalletMonitorError,
};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WALLET: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

fn test_config(uri: &str) -> WalletMonitorConfig {
    WalletMonitorConfigBuilder::new()
        .with_rpc(uri)
        .with_retry_backoff_secs(0)
        .build()
        .expect("Failed to build config")
}

fn signature_entry(signature: &str, slot: u64, block_time: Option<i64>) -> Value {
    json!({
        "signature": signature,
        "slot": slot,
        "err": null,
        "memo": null,
        "blockTime": block_time
    })
}

fn page_response(entries: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "result": entries,
        "id": 1
    }))
}

#[tokio::test]
async fn test_date_range_walks_across_page_boundaries() {
    let mock_server = MockServer::start().await;
    let start_ts = 1_700_000_000;
    let end_ts = 1_700_010_000;

    // Page 1: a full page. Entries 0..500 are newer than the range and are
    // skipped, 500..1000 land inside it; the oldest is still >= start so
    // the walk continues with the last signature as the cursor.
    let page_one: Vec<Value> = (0..1000)
        .map(|i| {
            signature_entry(
                &format!("sig{i}"),
                10_000 - i as u64,
                Some(1_700_015_000 - i as i64 * 10),
            )
        })
        .collect();

    // Page 2: 50 entries inside the range down to exactly `start`, then
    // entries strictly older than the range.
    let mut page_two: Vec<Value> = (0..50)
        .map(|i| {
            signature_entry(
                &format!("old{i}"),
                8000 - i as u64,
                Some(1_700_000_490 - i as i64 * 10),
            )
        })
        .collect();
    page_two.extend(
        (0..20).map(|i| signature_entry(&format!("stale{i}"), 7000 - i as u64, Some(1_699_999_990))),
    );

    Mock::given(method("POST"))
        .and(body_string_contains("getSignaturesForAddress"))
        .respond_with(page_response(page_one))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    // The follow-up request must carry the cursor of page one's oldest entry.
    Mock::given(method("POST"))
        .and(body_string_contains("getSignaturesForAddress"))
        .and(body_string_contains("sig999"))
        .respond_with(page_response(page_two))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let mode = ScanMode::DateRange {
        start: Utc.timestamp_opt(start_ts, 0).unwrap(),
        end: Utc.timestamp_opt(end_ts, 0).unwrap(),
    };
    let records = discover(&client, WALLET, &mode)
        .await
        .expect("date-range scan should succeed");

    // 500 from page one plus the 50 in-range entries of page two.
    assert_eq!(records.len(), 550);
    assert_eq!(records[0].signature, "sig500");
    assert_eq!(records[0].block_time, Some(end_ts), "end bound is inclusive");
    assert_eq!(
        records.last().unwrap().block_time,
        Some(start_ts),
        "start bound is inclusive"
    );

    let requests = mock_server
        .received_requests()
        .await
        .expect("requests recorded");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_slot_range_stops_at_the_first_older_slot() {
    let mock_server = MockServer::start().await;

    let page: Vec<Value> = [130u64, 125, 120, 115, 110, 105, 95, 90]
        .iter()
        .enumerate()
        .map(|(i, &slot)| signature_entry(&format!("slot{i}"), slot, Some(1_700_000_000)))
        .collect();

    Mock::given(method("POST"))
        .respond_with(page_response(page))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let mode = ScanMode::SlotRange {
        start_slot: 100,
        end_slot: 120,
    };
    let records = discover(&client, WALLET, &mode)
        .await
        .expect("slot-range scan should succeed");

    let slots: Vec<u64> = records.iter().map(|record| record.slot).collect();
    assert_eq!(slots, vec![120, 115, 110, 105]);

    let requests = mock_server
        .received_requests()
        .await
        .expect("requests recorded");
    assert_eq!(requests.len(), 1, "an older slot ends the walk");
}

#[tokio::test]
async fn test_latest_requests_one_page_without_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("getSignaturesForAddress"))
        .respond_with(page_response(vec![
            signature_entry("latest1", 200, Some(1_700_000_100)),
            signature_entry("latest2", 199, Some(1_700_000_050)),
        ]))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let records = discover(&client, WALLET, &ScanMode::Latest { limit: 25 })
        .await
        .expect("latest scan should succeed");

    assert_eq!(records.len(), 2);

    let requests = mock_server
        .received_requests()
        .await
        .expect("requests recorded");
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).expect("request body is JSON");
    assert_eq!(body["params"][1]["limit"], 25);
    assert!(
        body["params"][1].get("before").is_none(),
        "a latest scan starts from the tip"
    );
}

#[tokio::test]
async fn test_latest_swallows_transient_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let records = discover(&client, WALLET, &ScanMode::Latest { limit: 10 })
        .await
        .expect("transient failures degrade to an empty result");

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_auth_failures_escalate_out_of_discovery() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");

    let latest = discover(&client, WALLET, &ScanMode::Latest { limit: 10 }).await;
    assert!(matches!(latest, Err(WalletMonitorError::AuthFailure(_))));

    let ranged = discover(
        &client,
        WALLET,
        &ScanMode::SlotRange {
            start_slot: 1,
            end_slot: 2,
        },
    )
    .await;
    assert!(matches!(ranged, Err(WalletMonitorError::AuthFailure(_))));
}

#[tokio::test]
async fn test_page_failure_mid_walk_returns_partial_results() {
    let mock_server = MockServer::start().await;

    // A full first page inside the range, then permanent failures.
    let page_one: Vec<Value> = (0..1000)
        .map(|i| {
            signature_entry(
                &format!("sig{i}"),
                10_000 - i as u64,
                Some(1_700_005_000 - i as i64),
            )
        })
        .collect();

    Mock::given(method("POST"))
        .respond_with(page_response(page_one))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let mode = ScanMode::DateRange {
        start: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        end: Utc.timestamp_opt(1_700_010_000, 0).unwrap(),
    };
    let records = discover(&client, WALLET, &mode)
        .await
        .expect("partial results beat total failure");

    assert_eq!(records.len(), 1000);
}

#[tokio::test]
async fn test_incremental_scan_collects_up_to_the_marker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(page_response(vec![
            signature_entry("s5", 105, Some(1_700_000_500)),
            signature_entry("s4", 104, Some(1_700_000_400)),
            signature_entry("s3", 103, Some(1_700_000_300)),
            signature_entry("s2", 102, Some(1_700_000_200)),
            signature_entry("s1", 101, Some(1_700_000_100)),
        ]))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let scan = discover_since(&client, WALLET, Some("s2"))
        .await
        .expect("incremental scan should succeed");

    let signatures: Vec<&str> = scan
        .records
        .iter()
        .map(|record| record.signature.as_str())
        .collect();
    assert_eq!(signatures, vec!["s5", "s4", "s3"], "marker is exclusive");
    assert_eq!(scan.marker.as_deref(), Some("s5"));

    // The marker also bounds the request itself so the provider can stop
    // the page at it.
    let requests = mock_server
        .received_requests()
        .await
        .expect("requests recorded");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("request body is JSON");
    assert_eq!(body["params"][1]["until"], "s2");
}

#[tokio::test]
async fn test_incremental_scan_never_regresses_the_marker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(page_response(vec![signature_entry(
            "s9",
            109,
            Some(1_700_000_900),
        )]))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let scan = discover_since(&client, WALLET, Some("s9"))
        .await
        .expect("incremental scan should succeed");

    assert!(scan.records.is_empty());
    assert_eq!(
        scan.marker.as_deref(),
        Some("s9"),
        "no new records leaves the marker untouched"
    );
}

#[tokio::test]
async fn test_incremental_scan_without_marker_takes_recent_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(page_response(vec![
            signature_entry("a", 2, Some(1_700_000_002)),
            signature_entry("b", 1, Some(1_700_000_001)),
        ]))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let scan = discover_since(&client, WALLET, None)
        .await
        .expect("incremental scan should succeed");

    assert_eq!(scan.records.len(), 2);
    assert_eq!(scan.marker.as_deref(), Some("a"));

    let requests = mock_server
        .received_requests()
        .await
        .expect("requests recorded");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("request body is JSON");
    assert!(
        body["params"][1].get("until").is_none(),
        "a first scan has no marker to bound the request with"
    );
}

#[tokio::test]
async fn test_incremental_scan_respects_its_page_budget() {
    let mock_server = MockServer::start().await;

    // Every request returns the same full page and never the marker, so the
    // scan has to give up on its own.
    let page: Vec<Value> = (0..1000)
        .map(|i| signature_entry(&format!("sig{i}"), 10_000 - i as u64, Some(1_700_000_000)))
        .collect();
    Mock::given(method("POST"))
        .respond_with(page_response(page))
        .mount(&mock_server)
        .await;

    let client = RpcClient::new(&test_config(&mock_server.uri())).expect("Failed to build client");
    let scan = discover_since(&client, WALLET, Some("neverFound"))
        .await
        .expect("incremental scan should succeed");

    assert_eq!(scan.records.len(), 10_000);
    let requests = mock_server
        .received_requests()
        .await
        .expect("requests recorded");
    assert_eq!(requests.len(), 10, "the page budget bounds the walk");
}
