use beesync_client::{AlertSource, BackendClients, NotificationSource, ReadingSource};
use beesync_config::BackendConfig;
use mockito::{Matcher, Server};
use serde_json::json;

fn config(monitoring: &Server, services: &Server) -> BackendConfig {
    BackendConfig {
        monitoring_url: monitoring.url(),
        services_url: services.url(),
        ..BackendConfig::default()
    }
}

#[tokio::test]
async fn clients_route_to_their_backend() {
    let mut monitoring = Server::new_async().await;
    let mut services = Server::new_async().await;

    let latest = monitoring
        .mock("GET", "/api/synchronized/latest")
        .match_query(Matcher::UrlEncoded("hive_id".into(), "2".into()))
        .with_status(200)
        .with_body(
            json!({"success": true, "data": {
                "collection_timestamp": "2025-03-01T10:00:00", "hive_id": 2,
                "sensors": {"temperature": 35.1, "humidity": 58.0, "sound": 62.0, "weight": 41.0},
                "weather": {"temperature": 22.0, "humidity": 70.0}
            }})
            .to_string(),
        )
        .create_async()
        .await;
    let alerts = monitoring
        .mock("GET", "/api/threat/alerts")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let notifications = services
        .mock("GET", "/api/notifications")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let clients = BackendClients::from_config(&config(&monitoring, &services)).unwrap();

    let reading = clients.monitoring.latest(2).await.unwrap().unwrap();
    assert_eq!(reading.sensors.temperature, Some(35.1));
    assert!(clients.threat.alerts(None).await.unwrap().is_empty());
    assert!(clients.services.notifications().await.unwrap().is_empty());

    latest.assert_async().await;
    alerts.assert_async().await;
    notifications.assert_async().await;
}

#[tokio::test]
async fn unreachable_backend_is_an_error_not_a_panic() {
    let cfg = BackendConfig {
        monitoring_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: 2,
        ..BackendConfig::default()
    };
    let clients = BackendClients::from_config(&cfg).unwrap();
    assert!(clients.monitoring.list_hives().await.is_err());
}

#[test]
fn invalid_url_is_rejected() {
    let cfg = BackendConfig {
        services_url: "::not-a-url".to_string(),
        ..BackendConfig::default()
    };
    assert!(BackendClients::from_config(&cfg).is_err());
}
