//! End-to-end tests of the HTTP transport
//!
//! These spin up a real hub (broker + sweeper + axum server on an ephemeral
//! port) and drive it with an HTTP client, covering the long-poll watch
//! endpoint and the producer ingest endpoints.

use std::sync::Arc;
use std::time::Duration;

use fleet_relay::Snapshot;
use fleet_relay::api::{ApiConfig, ApiState, spawn_api_server};
use fleet_relay::broker::{Broker, SweeperHandle};
use fleet_relay::serialize::JsonSerializer;
use pretty_assertions::assert_eq;

/// Interval long enough that only explicit `sweep_now` calls matter
const QUIET_INTERVAL: Duration = Duration::from_secs(3600);

struct TestHub {
    base_url: String,
    broker: Arc<Broker>,
    sweeper: SweeperHandle,
}

async fn spawn_hub(long_poll_timeout: Duration) -> TestHub {
    let broker = Arc::new(Broker::new());
    let sweeper = SweeperHandle::spawn(broker.clone(), QUIET_INTERVAL);

    let state = ApiState::new(broker.clone(), Arc::new(JsonSerializer), long_poll_timeout);
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        enable_cors: false,
    };

    let addr = spawn_api_server(config, state).await.unwrap();

    TestHub {
        base_url: format!("http://{addr}"),
        broker,
        sweeper,
    }
}

fn publish_body(source: &str, channel: Option<&str>, marker: u64) -> serde_json::Value {
    serde_json::json!({
        "source": source,
        "channel": channel,
        "payload": { "seq": marker },
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn health_reports_broker_state() {
    let hub = spawn_hub(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/v1/health", hub.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pending_connections"], 0);
    assert_eq!(body["stored_channels"], 0);

    hub.sweeper.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn heartbeat_resolves_a_channel_less_watch() {
    let hub = spawn_hub(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let watch_url = format!("{}/api/v1/watch", hub.base_url);
    let watch = tokio::spawn(async move { reqwest::get(watch_url).await.unwrap() });

    // Wait for the watch request to land in the registry
    while hub.broker.pending_connections() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let publish = client
        .post(format!("{}/api/v1/publish/heartbeat", hub.base_url))
        .json(&publish_body("10.0.0.1:51243", None, 1))
        .send()
        .await
        .unwrap();
    assert_eq!(publish.status(), 202);

    let response = watch.await.unwrap();
    assert_eq!(response.status(), 200);
    let snapshot: Snapshot = response.json().await.unwrap();
    assert!(snapshot.is_heartbeat());
    assert_eq!(snapshot.payload, serde_json::json!({ "seq": 1 }));
    assert_eq!(hub.broker.pending_connections(), 0);

    hub.sweeper.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn escalation_reaches_a_channel_watch_via_the_sweep() {
    let hub = spawn_hub(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let watch_url = format!("{}/api/v1/watch?channel=db-pool-timeout", hub.base_url);
    let watch = tokio::spawn(async move { reqwest::get(watch_url).await.unwrap() });

    while hub.broker.pending_connections() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let publish = client
        .post(format!("{}/api/v1/publish/escalation", hub.base_url))
        .json(&publish_body("10.0.0.1:51243", Some("db-pool-timeout"), 7))
        .send()
        .await
        .unwrap();
    assert_eq!(publish.status(), 202);

    hub.sweeper.sweep_now().await;

    let response = watch.await.unwrap();
    assert_eq!(response.status(), 200);
    let snapshot: Snapshot = response.json().await.unwrap();
    assert_eq!(snapshot.channel.as_deref(), Some("db-pool-timeout"));
    assert_eq!(snapshot.payload, serde_json::json!({ "seq": 7 }));

    hub.sweeper.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn silent_channel_watch_gets_no_content_from_the_sweep() {
    let hub = spawn_hub(Duration::from_secs(5)).await;

    let watch_url = format!("{}/api/v1/watch?channel=no-such-channel", hub.base_url);
    let watch = tokio::spawn(async move { reqwest::get(watch_url).await.unwrap() });

    while hub.broker.pending_connections() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    hub.sweeper.sweep_now().await;

    let response = watch.await.unwrap();
    assert_eq!(response.status(), 204);
    assert_eq!(hub.broker.pending_connections(), 0);

    hub.sweeper.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn escalation_without_channel_is_rejected() {
    let hub = spawn_hub(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/publish/escalation", hub.base_url))
        .json(&publish_body("10.0.0.1:51243", None, 1))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("channel"));

    // The rejected publish must not have touched the store
    assert_eq!(hub.broker.stored_channels(), 0);

    hub.sweeper.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn watch_times_out_with_no_content() {
    let hub = spawn_hub(Duration::from_millis(200)).await;

    let response = reqwest::get(format!("{}/api/v1/watch", hub.base_url))
        .await
        .unwrap();

    assert_eq!(response.status(), 204);

    // The transport gave up but the registry entry lingers until the next
    // heartbeat claims it and finds the client gone
    assert_eq!(hub.broker.pending_connections(), 1);
    hub.broker
        .publish_heartbeat(Snapshot::heartbeat("10.0.0.1:51243", serde_json::json!({})))
        .await;
    assert_eq!(hub.broker.pending_connections(), 0);

    hub.sweeper.shutdown().await;
}
