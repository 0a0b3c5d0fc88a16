//! Page-level tests: drive the router with in-memory requests against mock
//! backends and check both the rendered HTML and the backend calls made.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use beesync_analytics::HoneyGrid;
use beesync_common::entities::PotentialLocation;
use beesync_config::Config;
use beesync_web::gate::{Endpoint, GateKey};
use beesync_web::router::build_router;
use beesync_web::state::{AppState, SharedState};
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

fn state_for(server: &Server) -> SharedState {
    let mut config = Config::default();
    config.backend.monitoring_url = server.url();
    config.backend.services_url = server.url();
    Arc::new(AppState::new(config).unwrap())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn hive_list_renders_one_row_per_hive() {
    let mut server = Server::new_async().await;
    let hives = server
        .mock("GET", "/api/hives")
        .with_status(200)
        .with_body(
            json!([{"id": 1, "name": "A", "location_lat": 6.9271, "location_lng": 79.8612,
                    "created_at": "2025-03-01T10:00:00"}])
            .to_string(),
        )
        .create_async()
        .await;

    let (status, html) = send(build_router(state_for(&server)), get("/hive-management")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<td>A</td>"));
    assert!(html.contains("<td>6.9271</td>"));
    assert_eq!(html.matches("/hive-management/1/edit").count(), 1);
    assert_eq!(html.matches(r#"class="row-actions""#).count(), 1);
    hives.assert_async().await;
}

#[tokio::test]
async fn empty_hive_name_issues_no_create() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", "/api/hives")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/hives")
        .expect(0)
        .create_async()
        .await;

    let (status, html) = send(
        build_router(state_for(&server)),
        post_form("/hive-management", "name=&location_lat=6.9&location_lng=79.8"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Name is required"));
    assert!(html.contains(r#"name="name" type="text" value="" required"#));
    create.assert_async().await;
}

#[tokio::test]
async fn valid_hive_form_creates_and_redirects() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/hives")
        .match_body(Matcher::Json(json!({"name": "North", "location_lat": 6.9, "location_lng": 79.8})))
        .with_status(201)
        .with_body(r#"{"id": 4}"#)
        .expect(1)
        .create_async()
        .await;

    let (status, _) = send(
        build_router(state_for(&server)),
        post_form("/hive-management", "name=North&location_lat=6.9&location_lng=79.8"),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    create.assert_async().await;
}

#[tokio::test]
async fn dashboard_fetches_selected_hive_with_default_window() {
    let mut server = Server::new_async().await;
    let latest = server
        .mock("GET", "/api/synchronized/latest")
        .match_query(Matcher::UrlEncoded("hive_id".into(), "2".into()))
        .with_status(200)
        .with_body(
            json!({"success": true, "data": {
                "collection_timestamp": "2025-03-01T10:00:00", "hive_id": 2,
                "sensors": {"temperature": 34.5, "humidity": 60.0, "sound": 55.0, "weight": 42.0},
                "weather": {"temperature": 24.0, "humidity": 70.0}
            }})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let historical = server
        .mock("GET", "/api/synchronized/historical")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("hive_id".into(), "2".into()),
            Matcher::UrlEncoded("hours".into(), "24".into()),
        ]))
        .with_status(200)
        .with_body(json!({"success": true, "data": []}).to_string())
        .expect(1)
        .create_async()
        .await;

    let (status, html) = send(build_router(state_for(&server)), get("/dashboard?hive_id=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("34.5°C"));
    assert!(html.contains(r#""labels":[]"#));
    latest.assert_async().await;
    historical.assert_async().await;
}

#[tokio::test]
async fn analyze_posts_exactly_once() {
    let mut server = Server::new_async().await;
    let predict = server
        .mock("POST", "/api/performance/predict")
        .match_body(Matcher::Json(json!({"hive_id": 1})))
        .with_status(200)
        .with_body(
            json!({"success": true, "prediction": {
                "predicted_level": 2, "interpretation": "Good performance",
                "confidence": 0.81, "risk_assessment": "Low risk",
                "all_probabilities": {"1": 0.1, "2": 0.81, "3": 0.09}
            }})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let (status, html) = send(
        build_router(state_for(&server)),
        post_form("/dashboard/analyze", "hive_id=1&range=24h"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Good performance"));
    assert!(html.contains("Confidence 81.0%"));
    predict.assert_async().await;
}

#[tokio::test]
async fn analyze_refused_while_in_flight() {
    let mut server = Server::new_async().await;
    let predict = server
        .mock("POST", "/api/performance/predict")
        .expect(0)
        .create_async()
        .await;

    let state = state_for(&server);
    let _running = state.gate.try_begin(GateKey::hive(1, Endpoint::Analyze)).unwrap();

    let (status, html) = send(build_router(state.clone()), post_form("/dashboard/analyze", "hive_id=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Analyzing…"));
    assert!(html.contains("disabled"));

    let resp = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dashboard/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"hive_id": 1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    predict.assert_async().await;
}

fn location(id: i64, lat: f64, lng: f64, honey: Option<f64>) -> PotentialLocation {
    PotentialLocation {
        id, lat, lng,
        temperature: 26.0, humidity: 65.0, sunlight_exposure: 8.0, wind_speed: 3.0,
        dist_to_water_source: 0.4, dist_to_flowering_area: 0.9, dist_to_feeding_station: 1.5,
        honey_production: honey,
    }
}

#[tokio::test]
async fn clear_all_requires_confirmation() {
    let mut server = Server::new_async().await;
    let clear = server
        .mock("DELETE", "/api/potential-locations/clear-all-predictions")
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server);
    state.placement.write().await.grid = HoneyGrid::build(vec![
        location(1, 7.0, 80.0, Some(12.0)),
        location(2, 6.9, 80.1, Some(4.0)),
    ]);

    // Unconfirmed: confirmation page only.
    let (status, html) = send(build_router(state.clone()), post_form("/NewHivePlacement/clear-all", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Yes, clear all"));
    assert_eq!(state.placement.read().await.grid.max_honey(), 12.0);

    let (status, html) = send(
        build_router(state.clone()),
        post_form("/NewHivePlacement/clear-all", "confirm=yes"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("All predictions cleared."));

    let snap = state.placement.read().await;
    assert!(snap.grid.locations().iter().all(|l| l.honey_production.is_none()));
    assert_eq!(snap.grid.max_honey(), 1.0);
    clear.assert_async().await;
}

#[tokio::test]
async fn unknown_path_renders_not_found() {
    let server = Server::new_async().await;
    let (status, html) = send(build_router(state_for(&server)), get("/no-such-page")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("/no-such-page"));
    assert!(html.contains(r#"class="sidebar"#));
}

#[tokio::test]
async fn registration_without_package_redirects() {
    let server = Server::new_async().await;
    let resp = build_router(state_for(&server))
        .oneshot(get("/register-hive"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/packages");
}

#[tokio::test]
async fn registration_failure_shows_backend_message() {
    let mut server = Server::new_async().await;
    let register = server
        .mock("POST", "/api/hive-register")
        .match_body(Matcher::PartialJson(json!({"packageTitle": "4-6 Hives", "email": "ada@example.com"})))
        .with_status(409)
        .with_body(r#"{"success": false, "message": "Email already registered"}"#)
        .expect(1)
        .create_async()
        .await;

    let body = "package=4-6+Hives&full_name=Ada+Lovelace&display_name=ada&phone_number=0123\
                &email=ada%40example.com&password=honeycomb&confirm_password=honeycomb\
                &company=&country=United+Kingdom";
    let (status, html) = send(build_router(state_for(&server)), post_form("/register-hive", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Email already registered"));
    register.assert_async().await;
}

#[tokio::test]
async fn sidebar_toggle_redirects_back() {
    let server = Server::new_async().await;
    let state = state_for(&server);
    let resp = build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ui/sidebar/toggle")
                .header(header::REFERER, "http://localhost:3000/alerts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/alerts");
    assert!(state.ui.read().await.sidebar_collapsed);
}

#[tokio::test]
async fn failed_window_switch_shows_no_history() {
    let mut server = Server::new_async().await;
    let _latest = server
        .mock("GET", "/api/synchronized/latest")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"success": true, "data": null}).to_string())
        .create_async()
        .await;
    let _day = server
        .mock("GET", "/api/synchronized/historical")
        .match_query(Matcher::UrlEncoded("hours".into(), "24".into()))
        .with_status(200)
        .with_body(
            json!({"success": true, "data": [{
                "collection_timestamp": "2025-03-01T09:05:00", "hive_id": 1,
                "sensors": {"temperature": 34.0}, "weather": {}
            }]})
            .to_string(),
        )
        .create_async()
        .await;
    let week = server
        .mock("GET", "/api/synchronized/historical")
        .match_query(Matcher::UrlEncoded("hours".into(), "168".into()))
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server);
    let (_, body) = send(build_router(state.clone()), get("/api/dashboard/charts?hive_id=1&range=24h")).await;
    let day: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(day["charts"]["temperature"]["labels"], json!(["09:05"]));

    let (status, body) = send(build_router(state.clone()), get("/api/dashboard/charts?hive_id=1&range=1w")).await;
    assert_eq!(status, StatusCode::OK);
    let week_view: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(week_view["hours"], 168);
    assert_eq!(week_view["charts"]["temperature"]["labels"], json!([]));

    // The day window is still there for a page that asks for it.
    let snap = state.hive_snapshot(1).await;
    assert_eq!(snap.history_for(24).len(), 1);
    assert!(snap.history_for(168).is_empty());
    week.assert_async().await;
}

fn upload(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "beesync-upload-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Request::builder()
        .method("POST")
        .uri("/health-identification")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_upload_rejects_non_image() {
    let mut server = Server::new_async().await;
    let predict = server.mock("POST", "/predict").expect(0).create_async().await;

    let (status, html) = send(
        build_router(state_for(&server)),
        upload("notes.txt", "text/plain", b"not an image"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Please select a valid image file"));
    predict.assert_async().await;
}

#[tokio::test]
async fn health_upload_over_limit_gets_size_message() {
    let mut server = Server::new_async().await;
    let predict = server.mock("POST", "/predict").expect(0).create_async().await;

    let eleven_mb = vec![0u8; 11 * 1024 * 1024];
    let (status, html) = send(
        build_router(state_for(&server)),
        upload("hive.png", "image/png", &eleven_mb),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("File size must be less than 10MB"));
    predict.assert_async().await;
}

#[tokio::test]
async fn health_backend_error_shows_status() {
    let mut server = Server::new_async().await;
    let predict = server
        .mock("POST", "/predict")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let (status, html) = send(
        build_router(state_for(&server)),
        upload("hive.png", "image/png", &[0x89, b'P', b'N', b'G']),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Server error: 500"));
    assert!(html.contains("data:image/png;base64,"));
    predict.assert_async().await;
}

#[tokio::test]
async fn dismissed_notification_hidden_without_backend_call() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", "/api/notifications")
        .with_status(200)
        .with_body(
            json!([
                {"id": 4, "hive_id": 1, "threat_type": "Wax_Moth", "message": "Moth larvae spotted",
                 "timestamp": "2025-03-01T10:00:00"},
                {"id": 5, "hive_id": 2, "threat_type": "Hornets", "message": "Hornet activity",
                 "timestamp": "2025-03-01T11:00:00"}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    let clear = server
        .mock("POST", "/api/notifications/clear")
        .expect(0)
        .create_async()
        .await;

    let state = state_for(&server);
    let (_, before) = send(build_router(state.clone()), get("/notifications")).await;
    assert!(before.contains("Moth larvae spotted"));

    let resp = build_router(state.clone())
        .oneshot(post_form("/notifications/4/dismiss", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/notifications");

    let (_, after) = send(build_router(state.clone()), get("/notifications")).await;
    assert!(!after.contains("Moth larvae spotted"));
    assert!(after.contains("Hornet activity"));
    clear.assert_async().await;
}

const THREAT_FORM: &str = "weather_temp_c=24&weather_humidity_pct=60&hive_sound_db=72\
                           &hive_sound_peak_freq=250&vibration_hz=120&vibration_var=0.3";

#[tokio::test]
async fn threat_form_with_text_issues_no_prediction() {
    let mut server = Server::new_async().await;
    let predict = server
        .mock("POST", "/api/threat/predict")
        .expect(0)
        .create_async()
        .await;

    let body = THREAT_FORM.replace("hive_sound_db=72", "hive_sound_db=loud");
    let (status, html) = send(build_router(state_for(&server)), post_form("/threat-detection", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Must be a number"));
    predict.assert_async().await;
}

#[tokio::test]
async fn threat_submission_renders_banner() {
    let mut server = Server::new_async().await;
    let predict = server
        .mock("POST", "/api/threat/predict")
        .match_body(Matcher::PartialJson(json!({"hive_sound_db": 72.0, "vibration_hz": 120.0})))
        .with_status(200)
        .with_body(json!({"threat_type": "Wax_Moth", "probability": 0.91}).to_string())
        .expect(1)
        .create_async()
        .await;

    let state = state_for(&server);
    let (status, html) = send(build_router(state.clone()), post_form("/threat-detection", THREAT_FORM)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("ALERT: Wax_Moth (91.0%)"));
    assert_eq!(
        state.last_threat.read().await.as_ref().map(|p| p.threat_type.clone()),
        Some("Wax_Moth".to_string())
    );
    predict.assert_async().await;
}
