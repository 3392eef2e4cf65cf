//! Ledger behavior against a real PostgreSQL database.
//!
//! Every test returns early when `DATABASE_URL` is unset. Ids carry a
//! random suffix so runs can share one database.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use sqlx::PgPool;
use uuid::Uuid;

use checkpoint_core::ErrorKind;
use checkpoint_core::config::DatabaseConfig;
use checkpoint_core::types::{EventId, TransactionId, UserId};
use checkpoint_database::pool;
use checkpoint_database::store::LedgerStore;
use checkpoint_database::{PgLedgerStore, PgUserDirectory};
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, ReasonType, UserPointsAccount};
use checkpoint_service::ScanFailureKind;

use crate::helpers::TestApp;

/// Migrated pool for `DATABASE_URL`, or `None` to skip.
async fn database() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        min_connections: 0,
        run_migrations: true,
        ..DatabaseConfig::default()
    };
    Some(
        pool::open(&config)
            .await
            .expect("DATABASE_URL should point at a reachable test database"),
    )
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn seed_user(pool: &PgPool, name: &str) -> UserId {
    let id = unique("user");
    sqlx::query("INSERT INTO users (id, display_name) VALUES ($1, $2)")
        .bind(&id)
        .bind(name)
        .execute(pool)
        .await
        .expect("Failed to seed user");
    UserId::new(id)
}

fn app_on(pool: &PgPool) -> TestApp {
    TestApp::with_backends(
        Arc::new(PgLedgerStore::new(pool.clone())),
        Arc::new(PgUserDirectory::new(pool.clone())),
    )
}

async fn count(pool: &PgPool, sql: &str, user_id: &UserId) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(user_id.as_str())
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_scans_leave_one_row_per_table() {
    let Some(pool) = database().await else {
        return;
    };
    let user = seed_user(&pool, "Una").await;
    let event = unique("event");
    let app = Arc::new(app_on(&pool));
    let token = app.profile_token(user.as_str());

    let scans: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            let token = token.clone();
            let event = event.clone();
            tokio::spawn(async move { app.scan_at(token, &event, Some(5)).await })
        })
        .collect();

    let mut successes = 0;
    for result in join_all(scans).await {
        let result = result.unwrap();
        match result.failure() {
            None => successes += 1,
            Some(failure) => assert_eq!(failure.kind, ScanFailureKind::AlreadyCheckedIn),
        }
    }
    assert_eq!(successes, 1);

    let check_ins = count(&pool, "SELECT COUNT(*) FROM check_ins WHERE user_id = $1", &user).await;
    let credits = count(
        &pool,
        "SELECT COUNT(*) FROM points_transactions WHERE user_id = $1",
        &user,
    )
    .await;
    assert_eq!(check_ins, 1);
    assert_eq!(credits, 1);
    assert_eq!(app.balance(user.as_str()).await, 5);
}

#[tokio::test]
async fn test_dropped_unit_rolls_back_and_releases_lock() {
    let Some(pool) = database().await else {
        return;
    };
    let store = PgLedgerStore::new(pool.clone());
    let user = seed_user(&pool, "Vic").await;
    let event = EventId::new(unique("event"));
    let now = Utc::now();

    let mut unit = store.begin(&user).await.unwrap();
    let record = CheckInRecord::new(user.clone(), event.clone(), 5, UserId::new("org"), now);
    assert!(unit.insert_check_in(&record).await.unwrap());
    let transaction = PointsTransaction {
        id: TransactionId::new(),
        user_id: user.clone(),
        sequence: 1,
        delta: 5,
        reason_type: ReasonType::EventAttendance,
        reference_id: Some(event.to_string()),
        recorded_at: now,
        resulting_balance: 5,
    };
    let account = UserPointsAccount {
        user_id: user.clone(),
        current_balance: 5,
        transaction_count: 1,
        updated_at: now,
    };
    unit.append(&transaction, &account).await.unwrap();
    drop(unit);

    let next = tokio::time::timeout(Duration::from_secs(5), store.begin(&user))
        .await
        .expect("advisory lock should be released on drop")
        .unwrap();
    drop(next);

    assert!(store.find_check_in(&user, &event).await.unwrap().is_none());
    assert!(store.list_transactions(&user).await.unwrap().is_empty());
    assert!(store.find_account(&user).await.unwrap().is_none());
}

#[tokio::test]
async fn test_transaction_chain_verifies() {
    let Some(pool) = database().await else {
        return;
    };
    let user = seed_user(&pool, "Wen").await;
    let app = app_on(&pool);

    for delta in [3, 40, 7] {
        app.services
            .points
            .append_transaction(&user, delta, ReasonType::ManualAward, None)
            .await
            .unwrap();
    }
    let event = unique("event");
    assert!(
        app.scan_at(app.profile_token(user.as_str()), &event, Some(50))
            .await
            .is_success()
    );

    let history = app.services.points.history(&user).await.unwrap();
    let sequences: Vec<i64> = history.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);

    let audit = app.services.points.verify_account(&user).await.unwrap();
    assert!(audit.is_consistent(), "{audit:?}");
    assert!(audit.chain_intact);
    assert_eq!(audit.materialized_balance, 100);
    assert_eq!(audit.recomputed_balance, 100);
    assert_eq!(audit.transaction_count, 4);
}

#[tokio::test]
async fn test_second_attendance_credit_is_duplicate_not_outage() {
    let Some(pool) = database().await else {
        return;
    };
    let user = seed_user(&pool, "Una").await;
    let event = unique("event");
    let app = app_on(&pool);
    assert!(
        app.scan_at(app.profile_token(user.as_str()), &event, Some(5))
            .await
            .is_success()
    );

    let err = app
        .services
        .points
        .append_transaction(&user, 5, ReasonType::EventAttendance, Some(event))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::AlreadyCheckedIn);
    assert!(!err.is_retryable());
    assert_eq!(app.balance(user.as_str()).await, 5);
}
