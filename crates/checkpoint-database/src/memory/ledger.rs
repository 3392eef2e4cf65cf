//! In-memory ledger store using DashMap and per-user Tokio mutexes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, UserPointsAccount};

use crate::store::{LedgerStore, LedgerUnit};

/// Everything committed for one user.
///
/// Kept in a single map entry so a commit replaces the user's check-ins,
/// transactions, and account under one shard lock.
#[derive(Debug, Default)]
struct UserLedger {
    account: Option<UserPointsAccount>,
    transactions: Vec<PointsTransaction>,
    check_ins: HashMap<EventId, CheckInRecord>,
}

/// In-memory ledger store.
///
/// Suitable for single-node deployments only; state is lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    /// Committed state per user.
    ledgers: Arc<DashMap<UserId, UserLedger>>,
    /// One async mutex per user, held by an open unit.
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(user_id.clone()).or_default())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self, user_id: &UserId) -> AppResult<Box<dyn LedgerUnit>> {
        let guard = self.user_lock(user_id).lock_owned().await;
        debug!(user_id = %user_id, "Ledger unit opened");

        Ok(Box::new(MemoryLedgerUnit {
            ledgers: Arc::clone(&self.ledgers),
            user_id: user_id.clone(),
            _guard: guard,
            check_ins: Vec::new(),
            transactions: Vec::new(),
            account: None,
        }))
    }

    async fn find_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> AppResult<Option<CheckInRecord>> {
        Ok(self
            .ledgers
            .get(user_id)
            .and_then(|ledger| ledger.check_ins.get(event_id).cloned()))
    }

    async fn list_check_ins(&self, event_id: &EventId) -> AppResult<Vec<CheckInRecord>> {
        let mut records: Vec<CheckInRecord> = self
            .ledgers
            .iter()
            .filter_map(|ledger| ledger.check_ins.get(event_id).cloned())
            .collect();
        records.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn find_account(&self, user_id: &UserId) -> AppResult<Option<UserPointsAccount>> {
        Ok(self
            .ledgers
            .get(user_id)
            .and_then(|ledger| ledger.account.clone()))
    }

    async fn list_transactions(&self, user_id: &UserId) -> AppResult<Vec<PointsTransaction>> {
        Ok(self
            .ledgers
            .get(user_id)
            .map(|ledger| ledger.transactions.clone())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// Buffered writes for one user, applied at commit.
struct MemoryLedgerUnit {
    ledgers: Arc<DashMap<UserId, UserLedger>>,
    user_id: UserId,
    _guard: OwnedMutexGuard<()>,
    check_ins: Vec<CheckInRecord>,
    transactions: Vec<PointsTransaction>,
    account: Option<UserPointsAccount>,
}

impl MemoryLedgerUnit {
    fn ensure_owner(&self, user_id: &UserId) -> AppResult<()> {
        if user_id != &self.user_id {
            return Err(AppError::internal(format!(
                "Ledger unit for '{}' cannot write records of '{}'",
                self.user_id, user_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerUnit for MemoryLedgerUnit {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn account(&mut self) -> AppResult<Option<UserPointsAccount>> {
        if let Some(account) = &self.account {
            return Ok(Some(account.clone()));
        }
        Ok(self
            .ledgers
            .get(&self.user_id)
            .and_then(|ledger| ledger.account.clone()))
    }

    async fn insert_check_in(&mut self, record: &CheckInRecord) -> AppResult<bool> {
        self.ensure_owner(&record.user_id)?;

        let pending = self
            .check_ins
            .iter()
            .any(|existing| existing.event_id == record.event_id);
        let committed = self
            .ledgers
            .get(&self.user_id)
            .is_some_and(|ledger| ledger.check_ins.contains_key(&record.event_id));

        if pending || committed {
            return Ok(false);
        }

        self.check_ins.push(record.clone());
        Ok(true)
    }

    async fn append(
        &mut self,
        transaction: &PointsTransaction,
        account: &UserPointsAccount,
    ) -> AppResult<()> {
        self.ensure_owner(&transaction.user_id)?;
        self.ensure_owner(&account.user_id)?;

        self.transactions.push(transaction.clone());
        self.account = Some(account.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let unit = *self;
        {
            let mut ledger = unit.ledgers.entry(unit.user_id.clone()).or_default();
            for record in unit.check_ins {
                ledger.check_ins.insert(record.event_id.clone(), record);
            }
            ledger.transactions.extend(unit.transactions);
            if let Some(account) = unit.account {
                ledger.account = Some(account);
            }
        }
        debug!(user_id = %unit.user_id, "Ledger unit committed");
        Ok(())
    }
}
