//! Dashboard loading and degradation

#![allow(clippy::unwrap_used)]

mod common;

use chargeops_client::{ClientError, DashboardLoader};
use chargeops_core::EntityKind;
use chrono::{TimeZone, Utc};
use common::logged_in;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_users(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "role": "admin", "status": "active", "created_at": "2024-03-02T10:00:00Z"},
            {"id": 2, "role": "operator", "status": "inactive", "created_at": "2024-01-15"},
            {"id": 3, "created_at": "2024-03-20 08:00:00"}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_dashboard() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/cps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cps": [
            {"id": 1, "status": "Available", "enabled": true, "total_sessions": 10},
            {"id": 2, "status": "Charging", "enabled": true, "total_sessions": 5}
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feedbacks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "rating": 5, "status": "New"},
            {"id": 2, "rating": 2, "status": "Resolved"}
        ])))
        .mount(&server)
        .await;

    let now = Utc.with_ymd_and_hms(2024, 3, 25, 12, 0, 0).unwrap();
    let snapshot = DashboardLoader::new(logged_in(&server)).load(now).await.unwrap();

    assert!(!snapshot.is_degraded());
    assert_eq!(snapshot.users.total, 3);
    assert_eq!(snapshot.users.admins, 1);
    assert_eq!(snapshot.users.new_this_month, 2);
    assert_eq!(snapshot.chargers.total, 2);
    assert_eq!(snapshot.chargers.charging, 1);
    assert_eq!(snapshot.feedback.total, 2);
    assert_eq!(snapshot.loaded_at, now);
}

#[tokio::test]
async fn test_secondary_failures_degrade() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/cps"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feedbacks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let snapshot = DashboardLoader::new(logged_in(&server))
        .load(Utc::now())
        .await
        .unwrap();

    assert_eq!(snapshot.degraded, vec![EntityKind::Charger]);
    assert_eq!(snapshot.chargers.total, 0);
    assert_eq!(snapshot.users.total, 3);
}

#[tokio::test]
async fn test_primary_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = DashboardLoader::new(logged_in(&server))
        .load(Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
}
