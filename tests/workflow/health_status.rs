use crate::workspace::Workspace;
use patchwarden::monitor::{ChangeType, HealthAggregator, HealthSnapshot, MonitorScheduler};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn status_reflects_stores_and_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .mount(&server)
        .await;

    let mut ws = Workspace::new();
    ws.config.monitor.health_url = Some(format!("{}/health", server.uri()));
    ws.add_patch("v1(P0.1.0)_a", "{}");
    ws.add_patch("v1(P0.2.0)_b", "{}");
    ws.add_report("v1(P0.1.0)_a");

    let aggregator = HealthAggregator::from_config(&ws.config);
    let snapshot = aggregator.tick().await;

    assert_eq!(snapshot.patches.pending, 1);
    assert_eq!(snapshot.patches.completed, 1);
    assert_eq!(snapshot.queue, vec!["v1(P0.2.0)_b".to_string()]);
    assert_eq!(snapshot.endpoint.status, "ok");
    assert_eq!(snapshot.recent_activity.len(), 1);

    let state_file = ws.config.monitor_state_path().expect("state file");
    let written: HealthSnapshot =
        serde_json::from_str(&std::fs::read_to_string(state_file).unwrap()).unwrap();
    assert_eq!(written, *snapshot);
}

#[tokio::test]
async fn unreachable_endpoint_does_not_fail_the_tick() {
    let mut ws = Workspace::new();
    ws.config.monitor.health_url = Some("http://127.0.0.1:9/health".into());
    ws.config.monitor.http_timeout_secs = 1;

    let snapshot = HealthAggregator::from_config(&ws.config).tick().await;
    assert_eq!(snapshot.endpoint.status, "unreachable");
}

#[tokio::test]
async fn scheduler_records_queue_changes_between_ticks() {
    let ws = Workspace::new();
    ws.add_patch("v1(P0.1.0)_a", "{}");
    let aggregator = Arc::new(HealthAggregator::from_config(&ws.config));
    let mut updates = aggregator.subscribe();

    let scheduler = MonitorScheduler::start(Arc::clone(&aggregator), Duration::from_millis(50));
    tokio::time::timeout(Duration::from_secs(2), updates.changed())
        .await
        .expect("first tick")
        .unwrap();

    ws.add_patch("v1(P0.2.0)_b", "{}");
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if aggregator
                .history()
                .iter()
                .any(|c| c.change_type == ChangeType::Patches)
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("patch change recorded");

    assert!(scheduler.is_running());
    scheduler.stop().await;
}
