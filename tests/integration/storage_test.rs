//! Scan behavior when the ledger store is unreachable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_database::MemoryLedgerStore;
use checkpoint_database::store::{LedgerStore, LedgerUnit};
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, UserPointsAccount};
use checkpoint_service::ScanFailureKind;

use crate::helpers::TestApp;

/// Memory store that refuses every call while `down` is set.
#[derive(Debug, Default)]
struct OutageStore {
    inner: MemoryLedgerStore,
    down: AtomicBool,
}

impl OutageStore {
    fn check(&self) -> AppResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::storage_unavailable(
                "connection to ledger-db.internal:5432 refused",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for OutageStore {
    async fn begin(&self, user_id: &UserId) -> AppResult<Box<dyn LedgerUnit>> {
        self.check()?;
        self.inner.begin(user_id).await
    }

    async fn find_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> AppResult<Option<CheckInRecord>> {
        self.check()?;
        self.inner.find_check_in(user_id, event_id).await
    }

    async fn list_check_ins(&self, event_id: &EventId) -> AppResult<Vec<CheckInRecord>> {
        self.check()?;
        self.inner.list_check_ins(event_id).await
    }

    async fn find_account(&self, user_id: &UserId) -> AppResult<Option<UserPointsAccount>> {
        self.check()?;
        self.inner.find_account(user_id).await
    }

    async fn list_transactions(&self, user_id: &UserId) -> AppResult<Vec<PointsTransaction>> {
        self.check()?;
        self.inner.list_transactions(user_id).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.down.load(Ordering::SeqCst))
    }
}

#[tokio::test]
async fn test_outage_reports_retryable_failure_without_details() {
    let store = Arc::new(OutageStore::default());
    store.down.store(true, Ordering::SeqCst);
    let app = TestApp::with_store(store.clone());

    let result = app.scan_at(app.profile_token("U"), "E", Some(5)).await;

    let failure = result.failure().expect("scan should fail during outage");
    assert_eq!(failure.kind, ScanFailureKind::StorageUnavailable);
    assert_eq!(
        failure.reason,
        "Service temporarily unavailable, please try again"
    );
    assert!(failure.retryable);
    assert!(!serde_json::to_string(&result).unwrap().contains("ledger-db"));
}

#[tokio::test]
async fn test_retry_after_outage_records_once() {
    let store = Arc::new(OutageStore::default());
    let app = TestApp::with_store(store.clone());
    let token = app.profile_token("U");

    store.down.store(true, Ordering::SeqCst);
    assert!(!app.scan_at(token.clone(), "E", Some(5)).await.is_success());

    store.down.store(false, Ordering::SeqCst);
    assert!(app.scan_at(token.clone(), "E", Some(5)).await.is_success());

    let retry = app.scan_at(token, "E", Some(5)).await;
    assert_eq!(
        retry.failure().map(|f| f.kind),
        Some(ScanFailureKind::AlreadyCheckedIn)
    );
    assert_eq!(app.balance("U").await, 5);
}
