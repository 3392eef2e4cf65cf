//! End-to-end scan scenarios.

use std::sync::Arc;

use chrono::TimeDelta;

use checkpoint_core::ErrorKind;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::points::{ReasonType, Tier};
use checkpoint_service::ScanFailureKind;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_first_scan_creates_check_in_and_awards_points() {
    let app = TestApp::new();

    let result = app.scan_at(app.profile_token("U"), "E", Some(5)).await;

    let success = result.success().expect("scan should succeed");
    assert_eq!(success.points_awarded, 5);
    assert_eq!(success.new_balance, 5);
    assert_eq!(success.tier, Tier::Bronze);
    assert!(!success.tier_changed);

    let record = app
        .services
        .check_ins
        .find_check_in(&UserId::new("U"), &EventId::new("E"))
        .await
        .unwrap()
        .expect("check-in recorded");
    assert_eq!(record.id, success.check_in_id);
    assert_eq!(record.scanned_by, UserId::new("org"));

    let history = app.services.points.history(&UserId::new("U")).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason_type, ReasonType::EventAttendance);
    assert_eq!(history[0].reference_id.as_deref(), Some("E"));
}

#[tokio::test]
async fn test_rescan_same_event_is_rejected() {
    let app = TestApp::new();
    assert!(app.scan_at(app.profile_token("U"), "E", Some(5)).await.is_success());

    let result = app.scan_at(app.profile_token("U"), "E", Some(5)).await;

    let failure = result.failure().expect("rescan should fail");
    assert_eq!(failure.kind, ScanFailureKind::AlreadyCheckedIn);
    assert_eq!(failure.reason, "Already checked in");
    assert_eq!(app.balance("U").await, 5);
}

#[tokio::test]
async fn test_same_token_at_another_event_succeeds() {
    let app = TestApp::new();
    let token = app.profile_token("U");

    assert!(app.scan_at(token.clone(), "E1", Some(5)).await.is_success());
    assert!(app.scan_at(token, "E2", Some(7)).await.is_success());
    assert_eq!(app.balance("U").await, 12);
}

#[tokio::test]
async fn test_crossing_one_hundred_promotes_to_silver() {
    let app = TestApp::new();
    app.services
        .points
        .append_transaction(&UserId::new("U"), 95, ReasonType::ManualAward, None)
        .await
        .unwrap();

    let result = app.scan_at(app.profile_token("U"), "E", Some(5)).await;

    let success = result.success().expect("scan should succeed");
    assert_eq!(success.new_balance, 100);
    assert_eq!(success.previous_tier, Tier::Bronze);
    assert_eq!(success.tier, Tier::Silver);
    assert!(success.tier_changed);
    assert_eq!(success.points_to_next_tier, Some(400));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_devices_racing_record_once() {
    let app = Arc::new(TestApp::new());
    let token = app.profile_token("U");

    let first = {
        let app = Arc::clone(&app);
        let token = token.clone();
        tokio::spawn(async move { app.scan_at(token, "E", Some(5)).await })
    };
    let second = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.scan_at(token, "E", Some(5)).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_success()).count();
    assert_eq!(successes, 1);

    let loser = results
        .iter()
        .find_map(|r| r.failure())
        .expect("one scan should fail");
    assert_eq!(loser.kind, ScanFailureKind::AlreadyCheckedIn);

    let roster = app
        .services
        .check_ins
        .list_check_ins(&EventId::new("E"))
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
    let history = app.services.points.history(&UserId::new("U")).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(app.balance("U").await, 5);
}

#[tokio::test]
async fn test_token_issued_25_hours_ago_is_expired() {
    let app = TestApp::new();
    let token = app.profile_token("U");
    app.advance(TimeDelta::hours(25));

    let err = app.services.codec.decode(&token).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExpiredPayload);

    let result = app.scan_at(token, "E", Some(5)).await;
    let failure = result.failure().expect("expired scan should fail");
    assert_eq!(failure.kind, ScanFailureKind::ExpiredPayload);
    assert_eq!(failure.reason, "QR code expired");
    assert_eq!(app.balance("U").await, 0);
}

#[tokio::test]
async fn test_ttl_boundary() {
    let app = TestApp::new();
    let fresh = app.profile_token("U");
    let stale = app.profile_token("V");

    app.advance(TimeDelta::hours(23) + TimeDelta::minutes(59));
    assert!(app.scan_at(fresh, "E", Some(5)).await.is_success());

    app.advance(TimeDelta::minutes(2));
    let result = app.scan_at(stale, "E", Some(5)).await;
    assert_eq!(
        result.failure().map(|f| f.kind),
        Some(ScanFailureKind::ExpiredPayload)
    );
}

#[tokio::test]
async fn test_typed_token_with_surrounding_whitespace() {
    let app = TestApp::new();
    let token = format!("  {}\n", app.profile_token("U"));
    assert!(app.scan_at(token, "E", Some(5)).await.is_success());
}

#[tokio::test]
async fn test_tampered_token_is_malformed() {
    let app = TestApp::new();
    let mut token = app.profile_token("U");
    token.truncate(token.len() / 2);
    token.push('!');

    let result = app.scan_at(token, "E", Some(5)).await;
    let failure = result.failure().expect("tampered scan should fail");
    assert_eq!(failure.kind, ScanFailureKind::MalformedPayload);
    assert_eq!(failure.reason, "Invalid QR code");
}

#[tokio::test]
async fn test_unknown_subject_reports_user_not_found() {
    let app = TestApp::new();
    let result = app.scan_at(app.profile_token("nobody"), "E", Some(5)).await;

    let failure = result.failure().expect("unknown user should fail");
    assert_eq!(failure.kind, ScanFailureKind::UnknownUser);
    assert_eq!(failure.reason, "User not found");
    assert!(
        app.services
            .check_ins
            .list_check_ins(&EventId::new("E"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_failure_json_is_tagged_and_opaque() {
    let app = TestApp::new();
    let result = app.scan_at(app.profile_token("nobody"), "E", Some(5)).await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "failure");
    assert_eq!(json["kind"], "unknown_user");
    assert!(!json.to_string().contains("nobody"));
}
