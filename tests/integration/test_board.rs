//! Board pagination through the real HTTP client.

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fantasy_ledger::api::LedgerSource;
use fantasy_ledger::engine::aggregator::{Aggregator, AggregatorConfig};
use fantasy_ledger::engine::fetcher::fetch_ledger;
use fantasy_ledger::types::SyncError;

use super::{league_client, LEAGUE_ID};

const BOARD_PATH: &str = "/api/v2/league/1683930/board";

fn market_events(start: u64, n: u64) -> Vec<Value> {
    (start..start + n)
        .map(|i| {
            json!({
                "type": "market",
                "date": 1_700_000_000 + i,
                "content": [{"player": i, "to": {"id": 5}, "amount": 1000}]
            })
        })
        .collect()
}

async fn mount_page(server: &MockServer, offset: u32, limit: u32, events: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", limit.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": events })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_board_request_carries_league_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .and(header("x-league", LEAGUE_ID.to_string().as_str()))
        .and(header("x-user", "10352455"))
        .and(header("x-version", "628"))
        .and(header("authorization", "Bearer test-bearer-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": market_events(0, 1)})))
        .expect(1)
        .mount(&server)
        .await;

    let page = league_client(&server).fetch_page(0, 100).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].kind, "market");
}

#[tokio::test]
async fn test_fetch_walks_pages_until_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, 0, 2, market_events(0, 2)).await;
    mount_page(&server, 2, 2, market_events(2, 2)).await;
    mount_page(&server, 4, 2, market_events(4, 1)).await;

    let ledger = fetch_ledger(&league_client(&server), 2).await.unwrap();

    assert_eq!(ledger.len(), 5);
    let players: Vec<u64> = ledger
        .iter()
        .map(|e| e.content.as_ref().unwrap()[0]["player"].as_u64().unwrap())
        .collect();
    assert_eq!(players, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_fetch_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, 0, 2, market_events(0, 2)).await;
    mount_page(&server, 2, 2, Vec::new()).await;

    let ledger = fetch_ledger(&league_client(&server), 2).await.unwrap();
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn test_missing_data_field_is_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let ledger = fetch_ledger(&league_client(&server), 100).await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_server_error_aborts_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, 0, 2, market_events(0, 2)).await;
    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch_ledger(&league_client(&server), 2).await.unwrap_err();
    match err.downcast_ref::<SyncError>() {
        Some(SyncError::Transport { endpoint, status, message }) => {
            assert_eq!(endpoint, "board");
            assert!(status.starts_with("503"));
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = league_client(&server).fetch_page(0, 100).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::Transport { .. })
    ));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BOARD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = league_client(&server).fetch_page(0, 100).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SyncError>(),
        Some(SyncError::MalformedData { .. })
    ));
}

#[tokio::test]
async fn test_fetched_ledger_aggregates() {
    let server = MockServer::start().await;
    let events = vec![
        json!({"type": "transfer", "content": [{"from": {"id": 3}, "to": {"id": 5}, "amount": 2000000}]}),
        json!({"type": "clauseIncrement", "content": [{"user": {"id": 5}, "amount": -500000}]}),
        json!({"type": "roundFinished", "content": {"results": [{"user": {"id": 5}, "bonus": 3000000}]}}),
        json!({"type": "playerMovements", "content": [{"to": {"id": 5}, "amount": 1}]}),
    ];
    mount_page(&server, 0, 100, events).await;

    let ledger = fetch_ledger(&league_client(&server), 100).await.unwrap();
    let book = Aggregator::new(AggregatorConfig::default()).aggregate(&ledger, &[3u64, 5u64]);

    assert_eq!(book[&3].total_income.to_string(), "2000000");
    assert_eq!(book[&5].total_expense.to_string(), "2000000");
    assert_eq!(book[&5].total_income.to_string(), "3500000");
    assert_eq!(book[&5].transactions.len(), 3);
}
