//! End-to-end HTTP flows against the full router (auth middleware included)

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use queue_server::{Config, ServerState, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "integration-secret";

fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
    config.admin_password = Some(PASSWORD.to_string());
    let state = ServerState::initialize(&config).unwrap();
    (build_router(state), dir)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

async fn reserve(app: &Router, name: &str, service_type: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/reservations",
        None,
        Some(json!({
            "name": name,
            "party_size": 2,
            "service_type": service_type,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["total_waiting"], 0);
    assert_eq!(body["storage"]["entry_count"], 0);

    reserve(&app, "Ana", "dine-in").await;
    let (_, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(body["storage"]["entry_count"], 1);
    assert_eq!(body["storage"]["last_entry_id"], 1);
}

#[tokio::test]
async fn test_reservation_positions_and_progress() {
    let (app, _dir) = test_app();

    let first = reserve(&app, "Ana", "dine-in").await;
    let second = reserve(&app, "Ben", "dine-in").await;
    let takeout = reserve(&app, "Cho", "takeout").await;

    assert_eq!(first["queue_position"], 1);
    assert_eq!(second["queue_position"], 2);
    // separate partition
    assert_eq!(takeout["queue_position"], 1);
    assert_eq!(second["entry"]["status"], "waiting");
    assert_eq!(second["entry"]["location"], "Main Dining");

    let uri = format!("/api/reservations/{}", second["id"]);
    let (status, detail) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["queue_position"], 2);

    let (status, snapshot) = send(&app, "GET", "/api/queue/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["total_waiting"], 3);

    let listed = snapshot["next"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == second["id"])
        .unwrap();
    assert_eq!(listed["position"], 2);
    let prediction = snapshot["predictions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["entry_id"] == second["id"])
        .unwrap();
    assert_eq!(prediction["position"], 2);
    assert!(prediction["estimated_wait"].is_f64());
    assert_eq!(prediction["estimated_wait"], second["estimated_wait"]);
}

#[tokio::test]
async fn test_public_views_hide_contact_details() {
    let (app, _dir) = test_app();
    let (status, created) = send(
        &app,
        "POST",
        "/api/reservations",
        None,
        Some(json!({
            "name": "Ana",
            "phone": "555-1234",
            "email": "ana@example.com",
            "party_size": 2,
            "service_type": "dine-in",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // the customer sees their own submission
    assert_eq!(created["entry"]["phone"], "555-1234");

    let (_, snapshot) = send(&app, "GET", "/api/queue/status", None, None).await;
    let next = &snapshot["next"][0];
    assert_eq!(next["name"], "Ana");
    assert!(next.get("phone").is_none());
    assert!(next.get("email").is_none());

    let uri = format!("/api/reservations/{}", created["id"]);
    let (_, detail) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(detail["entry"]["status"], "waiting");
    assert!(detail["entry"].get("phone").is_none());
    assert!(detail["entry"].get("email").is_none());

    // admins still get the full record
    let token = login(&app).await;
    let (_, list) = send(&app, "GET", "/api/queue", Some(&token), None).await;
    assert_eq!(list[0]["phone"], "555-1234");
    assert_eq!(list[0]["email"], "ana@example.com");
}

#[tokio::test]
async fn test_bad_query_and_path_return_error_json() {
    let (app, _dir) = test_app();
    let token = login(&app).await;

    let (status, body) = send(&app, "GET", "/api/queue?status=bogus", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert_eq!(body["details"]["field"], "status");
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/api/reservations/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert!(body["details"]["field"].is_string());

    let (status, body) = send(&app, "DELETE", "/api/admin/queue/-1", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_reservation_validation_errors() {
    let (app, _dir) = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/reservations",
        None,
        Some(json!({ "name": "Ana", "party_size": 0, "service_type": "dine-in" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "party_size");

    let (status, body) = send(
        &app,
        "POST",
        "/api/reservations",
        None,
        Some(json!({ "name": "Ana", "party_size": 2, "service_type": "buffet" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4101);

    let (status, _) = send(
        &app,
        "POST",
        "/api/reservations",
        None,
        Some(json!({ "name": "   ", "party_size": 2, "service_type": "dine-in" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/reservations/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let (app, _dir) = test_app();

    for (method, uri) in [
        ("GET", "/api/queue"),
        ("GET", "/api/admin/settings"),
        ("GET", "/api/analytics"),
        ("GET", "/api/admin/export"),
        ("DELETE", "/api/admin/queue/1"),
    ] {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["code"], 1001);
    }

    let (status, _) = send(&app, "GET", "/api/queue", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let (app, _dir) = test_app();
    let token = login(&app).await;

    let (status, _) = send(&app, "GET", "/api/queue", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", "/api/admin/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/queue", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_status_lifecycle() {
    let (app, _dir) = test_app();
    let token = login(&app).await;
    let created = reserve(&app, "Ana", "dine-in").await;
    let uri = format!("/api/admin/queue/{}", created["id"]);

    let (status, entry) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "status": "serving", "notes": "table 4" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["status"], "serving");
    assert_eq!(entry["notes"], "table 4");
    assert!(entry["serving_at"].is_i64());

    // serving cannot go back to waiting
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "status": "waiting" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4002);

    let (status, entry) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(entry["resolved_at"].is_i64());

    let (status, list) = send(&app, "GET", "/api/queue?status=completed", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settings_update_and_queue_limit() {
    let (app, _dir) = test_app();
    let token = login(&app).await;

    let (status, settings) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&token),
        Some(json!({ "max_queue_size": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["max_queue_size"], 1);
    assert_eq!(settings["auto_cleanup"], true);

    reserve(&app, "Ana", "dine-in").await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/reservations",
        None,
        Some(json!({ "name": "Ben", "party_size": 2, "service_type": "takeout" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4003);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/admin/settings",
        Some(&token),
        Some(json!({ "max_wait_time": 100000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, settings) = send(&app, "GET", "/api/admin/settings", Some(&token), None).await;
    assert_eq!(settings["max_wait_time"], 120);
}

#[tokio::test]
async fn test_export_and_analytics() {
    let (app, _dir) = test_app();
    let token = login(&app).await;
    reserve(&app, "Ana", "dine-in").await;
    reserve(&app, "Ben", "delivery").await;

    let (status, bundle) = send(&app, "GET", "/api/admin/export", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bundle["entries"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, "GET", "/api/admin/export?format=xml", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, summary) = send(&app, "GET", "/api/analytics", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalReservations"], 2);
    assert_eq!(summary["dailyStats"].as_array().unwrap().len(), 7);

    let (status, waits) = send(&app, "GET", "/api/analytics/wait-times", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(waits.as_array().unwrap().len(), 24);

    let (status, services) = send(&app, "GET", "/api/services", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(services.is_object() || services.is_array());
}

#[tokio::test]
async fn test_deleted_entry_leaves_analytics() {
    let (app, _dir) = test_app();
    let token = login(&app).await;
    let first = reserve(&app, "Ana", "dine-in").await;
    reserve(&app, "Ben", "takeout").await;

    let (_, summary) = send(&app, "GET", "/api/analytics", Some(&token), None).await;
    assert_eq!(summary["totalReservations"], 2);

    let uri = format!("/api/admin/queue/{}", first["id"]);
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, summary) = send(&app, "GET", "/api/analytics", Some(&token), None).await;
    assert_eq!(summary["totalReservations"], 1);
    let (_, snapshot) = send(&app, "GET", "/api/queue/status", None, None).await;
    assert_eq!(snapshot["total_waiting"], 1);
}
