//! Ledger properties under concurrent load.

use std::sync::Arc;

use futures::future::join_all;

use checkpoint_core::ErrorKind;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::points::{Tier, tier_for};

use crate::helpers::{TestApp, USERS};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_check_ins_succeed_once_per_pair() {
    let app = Arc::new(TestApp::new());
    let events = ["E1", "E2", "E3"];

    let mut attempts = Vec::new();
    for (user, _) in USERS {
        for event in events {
            for device in 0..8 {
                let app = Arc::clone(&app);
                attempts.push(tokio::spawn(async move {
                    app.services
                        .check_ins
                        .record_check_in(
                            &UserId::new(user),
                            &EventId::new(event),
                            10,
                            &UserId::new(format!("device-{device}")),
                        )
                        .await
                }));
            }
        }
    }

    let mut successes = 0;
    for outcome in join_all(attempts).await {
        match outcome.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::AlreadyCheckedIn),
        }
    }
    assert_eq!(successes, USERS.len() * events.len());

    for (user, _) in USERS {
        let user_id = UserId::new(user);
        let history = app.services.points.history(&user_id).await.unwrap();
        assert_eq!(history.len(), events.len());
        assert_eq!(app.balance(user).await, 30);
    }
    for event in events {
        let roster = app
            .services
            .check_ins
            .list_check_ins(&EventId::new(event))
            .await
            .unwrap();
        assert_eq!(roster.len(), USERS.len());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_balance_equals_sum_of_deltas_after_mixed_load() {
    let app = Arc::new(TestApp::new());

    let tasks: Vec<_> = (0..60)
        .map(|i| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let (user, _) = USERS[i % USERS.len()];
                let token = app.profile_token(user);
                app.scan_at(token, &format!("E{}", i % 7), Some((i as i64 % 5) + 1))
                    .await
            })
        })
        .collect();
    for task in join_all(tasks).await {
        task.unwrap();
    }

    for (user, _) in USERS {
        let user_id = UserId::new(user);
        let history = app.services.points.history(&user_id).await.unwrap();
        let sum: i64 = history.iter().map(|t| t.delta).sum();
        assert_eq!(app.balance(user).await, sum);

        let audit = app.services.points.verify_account(&user_id).await.unwrap();
        assert!(audit.is_consistent(), "drift for {user}: {audit:?}");
    }
}

#[tokio::test]
async fn test_every_check_in_has_exactly_one_attendance_credit() {
    let app = TestApp::new();
    for event in ["E1", "E2", "E3"] {
        app.scan_at(app.profile_token("U"), event, Some(4)).await;
        app.scan_at(app.profile_token("U"), event, Some(4)).await;
    }

    let user_id = UserId::new("U");
    let history = app.services.points.history(&user_id).await.unwrap();
    assert_eq!(history.len(), 3);
    for transaction in &history {
        let event_id = EventId::new(transaction.reference_id.clone().unwrap());
        let record = app
            .services
            .check_ins
            .find_check_in(&user_id, &event_id)
            .await
            .unwrap()
            .expect("credit without a check-in");
        assert_eq!(record.points_awarded, transaction.delta);
    }
}

#[test]
fn test_tier_never_decreases_as_balance_grows() {
    let mut previous = Tier::Bronze;
    for balance in 0..=2_500 {
        let tier = tier_for(balance);
        assert!(tier >= previous, "tier dropped at balance {balance}");
        previous = tier;
    }
    assert_eq!(tier_for(99), Tier::Bronze);
    assert_eq!(tier_for(100), Tier::Silver);
    assert_eq!(tier_for(499), Tier::Silver);
    assert_eq!(tier_for(500), Tier::Gold);
    assert_eq!(tier_for(1_999), Tier::Gold);
    assert_eq!(tier_for(2_000), Tier::Platinum);
}
