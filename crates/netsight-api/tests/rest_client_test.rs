// Integration tests for `RestClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netsight_api::rest::{EventQuery, NoCredentials, RequestSpec, StaticToken};
use netsight_api::{CredentialStore, Error, RestClient, RestConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> RestConfig {
    let mut config = RestConfig::new(Url::parse(&format!("{}/api/v1", server.uri())).unwrap());
    config.retry.base_delay = Duration::from_millis(10);
    config
}

fn client_with(config: RestConfig, credentials: Arc<dyn CredentialStore>) -> RestClient {
    RestClient::with_client(reqwest::Client::new(), config, credentials)
}

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = client_with(config(&server), Arc::new(NoCredentials));
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_wrapped_listing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                { "id": "d1", "ip": "192.168.1.10", "name": "router", "type": "router", "status": "online" },
                { "ip_address": "192.168.1.11", "hostname": "nas", "ping_ms": "3ms" }
            ]
        })))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id.as_deref(), Some("d1"));
    assert_eq!(devices[1].ip_address.as_deref(), Some("192.168.1.11"));
    assert_eq!(devices[1].ping_ms, Some(3.0));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let client = client_with(config(&server), Arc::new(StaticToken::new("secret-token")));

    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.test_connection().await.unwrap();
}

#[tokio::test]
async fn test_event_filters_become_query_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events"))
        .and(query_param("since", "2024-05-01T10:00:00Z"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 7, "type": "Connection", "device": "10.0.0.2", "message": "joined", "level": "info" }
        ])))
        .mount(&server)
        .await;

    let events = client
        .list_events(&EventQuery {
            since: Some("2024-05-01T10:00:00Z".into()),
            limit: Some(50),
            severity: None,
        })
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id.as_deref(), Some("7"));
    assert_eq!(events[0].description.as_deref(), Some("joined"));
}

#[tokio::test]
async fn test_export_events_returns_raw_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/events/export"))
        .and(query_param("format", "csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id,type\n1,Connection\n"))
        .mount(&server)
        .await;

    let body = client.export_events("csv").await.unwrap();
    assert_eq!(&body[..], b"id,type\n1,Connection\n");
}

#[tokio::test]
async fn test_ping_device_fills_template() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/dev-3/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ping": 12.5, "success": true })))
        .mount(&server)
        .await;

    let result = client.ping_device("dev-3").await.unwrap();
    assert_eq!(result.latency_ms, Some(12.5));
    assert_eq!(result.reachable, Some(true));
}

// ── Retry behaviour ─────────────────────────────────────────────────

#[tokio::test]
async fn test_retries_transient_status_then_succeeds() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/metrics/system"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/metrics/system"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cpu": 42, "memory": 61.5 })))
        .expect(1)
        .mount(&server)
        .await;

    let health = client.system_health().await.unwrap();
    assert_eq!(health.cpu_usage, Some(42.0));
    assert_eq!(health.memory_usage, Some(61.5));
}

#[tokio::test]
async fn test_retries_after_timeout() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.timeout = Duration::from_millis(100);
    let client = client_with(config, Arc::new(NoCredentials));

    Mock::given(method("GET"))
        .and(path("/api/v1/traffic/realtime"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/traffic/realtime"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "realtime": { "upload": 12.5, "download": 48.0 } })),
        )
        .mount(&server)
        .await;

    let traffic = client.traffic_realtime().await.unwrap();
    let point = traffic.realtime.unwrap();
    assert_eq!(point.upload, Some(12.5));
    assert_eq!(point.download, Some(48.0));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such device"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_device("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::Status { status: 404, ref body } if body == "no such device"));
}

#[tokio::test]
async fn test_post_is_not_retried_by_default() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/scan"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.scan_devices().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_idempotent_post_is_retried() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/alerts/a-9/acknowledge"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/alerts/a-9/acknowledge"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.acknowledge_alert("a-9").await.unwrap();
}

#[tokio::test]
async fn test_retries_exhausted_reports_attempts() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.retry.max_retries = 2;
    let client = client_with(config, Arc::new(NoCredentials));

    Mock::given(method("GET"))
        .and(path("/api/v1/metrics/network"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client.network_stats().await.unwrap_err();
    match err {
        Error::RetriesExhausted { attempts, ref last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.status(), Some(500));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

// ── Batch ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_isolates_failures() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/network/topology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nodes": [] })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/network/map"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let outcome = client
        .batch::<serde_json::Value>(vec![
            RequestSpec::get("/network/topology"),
            RequestSpec::get("/network/map"),
        ])
        .await;

    assert!(!outcome.all_succeeded());
    assert_eq!(outcome.successes().count(), 1);

    let failures: Vec<_> = outcome.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.path(), "/network/map");
    assert_eq!(failures[0].1.status(), Some(403));

    let results = outcome.into_results();
    assert_eq!(results[0].as_ref().unwrap()["nodes"], json!([]));
}
