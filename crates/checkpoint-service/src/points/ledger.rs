//! Points ledger: immutable transactions with a materialized balance.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{Clock, TransactionId, UserId};
use checkpoint_database::store::{LedgerStore, LedgerUnit};
use checkpoint_entity::points::{
    PointsTransaction, ReasonType, Tier, UserPointsAccount, tier_for,
};

/// Result of recomputing a user's balance from the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerAudit {
    /// Audited user.
    pub user_id: UserId,
    /// Balance stored on the account (0 if there is none).
    pub materialized_balance: i64,
    /// Sum of all transaction deltas.
    pub recomputed_balance: i64,
    /// Number of transactions read.
    pub transaction_count: i64,
    /// Whether every entry's `resulting_balance` and `sequence` follow
    /// from the previous entry.
    pub chain_intact: bool,
}

impl LedgerAudit {
    /// Whether the stored balance matches the log.
    pub fn is_consistent(&self) -> bool {
        self.chain_intact && self.materialized_balance == self.recomputed_balance
    }
}

/// Appends credits and answers balance queries.
///
/// This ledger does not deduplicate; callers that need at-most-once
/// semantics (check-ins) provide them.
#[derive(Debug, Clone)]
pub struct PointsLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl PointsLedger {
    /// Creates a new points ledger.
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The store this ledger writes to.
    pub fn store(&self) -> Arc<dyn LedgerStore> {
        Arc::clone(&self.store)
    }

    /// The time source stamped on new entries.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Append a credit in its own unit of work.
    pub async fn append_transaction(
        &self,
        user_id: &UserId,
        delta: i64,
        reason_type: ReasonType,
        reference_id: Option<String>,
    ) -> AppResult<PointsTransaction> {
        let mut unit = self.store.begin(user_id).await?;
        let (transaction, _) = self
            .append_in_unit(&mut *unit, delta, reason_type, reference_id)
            .await?;
        unit.commit().await?;
        Ok(transaction)
    }

    /// Append a credit inside an open unit, returning the entry and the
    /// account it produces. Nothing is visible until the unit commits.
    pub async fn append_in_unit(
        &self,
        unit: &mut dyn LedgerUnit,
        delta: i64,
        reason_type: ReasonType,
        reference_id: Option<String>,
    ) -> AppResult<(PointsTransaction, UserPointsAccount)> {
        if delta <= 0 {
            return Err(AppError::validation(format!(
                "Points delta must be positive, got {delta}"
            )));
        }

        let now = self.clock.now();
        let user_id = unit.user_id().clone();
        let current = unit
            .account()
            .await?
            .unwrap_or_else(|| UserPointsAccount::empty(user_id.clone(), now));

        let resulting_balance = current.current_balance.checked_add(delta).ok_or_else(|| {
            AppError::validation(format!(
                "Crediting {delta} points to '{user_id}' would overflow the balance"
            ))
        })?;
        let sequence = current.transaction_count + 1;

        let transaction = PointsTransaction {
            id: TransactionId::new(),
            user_id: user_id.clone(),
            sequence,
            delta,
            reason_type,
            reference_id,
            recorded_at: now,
            resulting_balance,
        };
        let account = UserPointsAccount {
            user_id: user_id.clone(),
            current_balance: resulting_balance,
            transaction_count: sequence,
            updated_at: now,
        };

        unit.append(&transaction, &account).await?;

        info!(
            user_id = %user_id,
            delta,
            reason = %reason_type,
            sequence,
            balance = resulting_balance,
            "Points transaction appended"
        );
        Ok((transaction, account))
    }

    /// Current balance; 0 for a user with no transactions.
    pub async fn get_balance(&self, user_id: &UserId) -> AppResult<i64> {
        Ok(self
            .store
            .find_account(user_id)
            .await?
            .map(|account| account.current_balance)
            .unwrap_or(0))
    }

    /// Tier for the current balance.
    pub async fn get_tier(&self, user_id: &UserId) -> AppResult<Tier> {
        self.get_balance(user_id).await.map(tier_for)
    }

    /// The materialized account, if the user has any transactions.
    pub async fn get_account(&self, user_id: &UserId) -> AppResult<Option<UserPointsAccount>> {
        self.store.find_account(user_id).await
    }

    /// All transactions for a user, oldest first.
    pub async fn history(&self, user_id: &UserId) -> AppResult<Vec<PointsTransaction>> {
        self.store.list_transactions(user_id).await
    }

    /// Recompute the balance from the log and compare it with the account.
    pub async fn verify_account(&self, user_id: &UserId) -> AppResult<LedgerAudit> {
        let transactions = self.store.list_transactions(user_id).await?;
        let materialized_balance = self.get_balance(user_id).await?;

        let mut running = 0i64;
        let mut chain_intact = true;
        for (index, transaction) in transactions.iter().enumerate() {
            running = running.saturating_add(transaction.delta);
            if transaction.resulting_balance != running
                || transaction.sequence != index as i64 + 1
            {
                chain_intact = false;
            }
        }

        let audit = LedgerAudit {
            user_id: user_id.clone(),
            materialized_balance,
            recomputed_balance: running,
            transaction_count: transactions.len() as i64,
            chain_intact,
        };

        if !audit.is_consistent() {
            warn!(
                user_id = %user_id,
                materialized = audit.materialized_balance,
                recomputed = audit.recomputed_balance,
                chain_intact = audit.chain_intact,
                "Points ledger drift detected"
            );
        }

        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_core::ErrorKind;
    use checkpoint_core::types::SystemClock;
    use checkpoint_database::MemoryLedgerStore;

    fn ledger() -> PointsLedger {
        PointsLedger::new(Arc::new(MemoryLedgerStore::new()), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_balance_is_zero_without_account() {
        let ledger = ledger();
        let user = UserId::new("nobody");
        assert_eq!(ledger.get_balance(&user).await.unwrap(), 0);
        assert_eq!(ledger.get_tier(&user).await.unwrap(), Tier::Bronze);
        assert!(ledger.get_account(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_chains_resulting_balance() {
        let ledger = ledger();
        let user = UserId::new("u1");

        let first = ledger
            .append_transaction(&user, 40, ReasonType::ManualAward, None)
            .await
            .unwrap();
        let second = ledger
            .append_transaction(&user, 15, ReasonType::EventAttendance, Some("e1".into()))
            .await
            .unwrap();

        assert_eq!((first.sequence, first.resulting_balance), (1, 40));
        assert_eq!((second.sequence, second.resulting_balance), (2, 55));
        assert_eq!(second.previous_balance(), first.resulting_balance);
        assert_eq!(ledger.get_balance(&user).await.unwrap(), 55);

        let account = ledger.get_account(&user).await.unwrap().unwrap();
        assert_eq!(account.transaction_count, 2);
    }

    #[tokio::test]
    async fn test_non_positive_delta_rejected() {
        let ledger = ledger();
        let user = UserId::new("u1");
        for delta in [0, -10] {
            let err = ledger
                .append_transaction(&user, delta, ReasonType::ManualAward, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
        assert!(ledger.history(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflow_rejected() {
        let ledger = ledger();
        let user = UserId::new("u1");
        ledger
            .append_transaction(&user, i64::MAX, ReasonType::ManualAward, None)
            .await
            .unwrap();
        let err = ledger
            .append_transaction(&user, 1, ReasonType::ManualAward, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(ledger.get_balance(&user).await.unwrap(), i64::MAX);
    }

    #[tokio::test]
    async fn test_tier_flips_on_crossing_transaction() {
        let ledger = ledger();
        let user = UserId::new("u1");
        ledger
            .append_transaction(&user, 95, ReasonType::ManualAward, None)
            .await
            .unwrap();
        assert_eq!(ledger.get_tier(&user).await.unwrap(), Tier::Bronze);

        let crossing = ledger
            .append_transaction(&user, 5, ReasonType::EventAttendance, Some("e1".into()))
            .await
            .unwrap();
        assert_eq!(crossing.resulting_balance, 100);
        assert_eq!(tier_for(crossing.previous_balance()), Tier::Bronze);
        assert_eq!(ledger.get_tier(&user).await.unwrap(), Tier::Silver);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_for_one_user_serialize() {
        let ledger = Arc::new(ledger());
        let user = UserId::new("busy");

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..50 {
            let ledger = Arc::clone(&ledger);
            let user = user.clone();
            tasks.spawn(async move {
                ledger
                    .append_transaction(&user, 3, ReasonType::ManualAward, None)
                    .await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let history = ledger.history(&user).await.unwrap();
        assert_eq!(history.len(), 50);
        let sequences: Vec<i64> = history.iter().map(|t| t.sequence).collect();
        assert_eq!(sequences, (1..=50).collect::<Vec<_>>());
        assert_eq!(ledger.get_balance(&user).await.unwrap(), 150);

        let audit = ledger.verify_account(&user).await.unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.transaction_count, 50);
    }

    #[tokio::test]
    async fn test_verify_account_on_empty_user() {
        let audit = ledger()
            .verify_account(&UserId::new("nobody"))
            .await
            .unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.recomputed_balance, 0);
    }
}
