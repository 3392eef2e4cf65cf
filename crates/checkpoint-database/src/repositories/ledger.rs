//! PostgreSQL ledger store.
//!
//! Per-user serialization uses a transaction-scoped advisory lock, so it
//! holds across every process sharing the database. The `(user_id,
//! event_id)` primary key on `check_ins` is the final uniqueness guard.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use checkpoint_core::error::AppError;
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, UserPointsAccount};

use super::storage_error;
use crate::store::{LedgerStore, LedgerUnit};

/// Advisory lock namespace for points accounts.
const LOCK_NAMESPACE: &str = "checkpoint.points:";

/// Ledger store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Create a new ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self, user_id: &UserId) -> AppResult<Box<dyn LedgerUnit>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin ledger transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{LOCK_NAMESPACE}{user_id}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to lock points account", e))?;

        debug!(user_id = %user_id, "Ledger unit opened");
        Ok(Box::new(PgLedgerUnit {
            tx,
            user_id: user_id.clone(),
        }))
    }

    async fn find_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> AppResult<Option<CheckInRecord>> {
        sqlx::query_as::<_, CheckInRecord>(
            "SELECT id, user_id, event_id, points_awarded, scanned_by, recorded_at \
             FROM check_ins WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to find check-in", e))
    }

    async fn list_check_ins(&self, event_id: &EventId) -> AppResult<Vec<CheckInRecord>> {
        sqlx::query_as::<_, CheckInRecord>(
            "SELECT id, user_id, event_id, points_awarded, scanned_by, recorded_at \
             FROM check_ins WHERE event_id = $1 ORDER BY recorded_at ASC, id ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list check-ins", e))
    }

    async fn find_account(&self, user_id: &UserId) -> AppResult<Option<UserPointsAccount>> {
        sqlx::query_as::<_, UserPointsAccount>(
            "SELECT user_id, current_balance, transaction_count, updated_at \
             FROM points_accounts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to find points account", e))
    }

    async fn list_transactions(&self, user_id: &UserId) -> AppResult<Vec<PointsTransaction>> {
        sqlx::query_as::<_, PointsTransaction>(
            "SELECT id, user_id, sequence, delta, reason_type, reference_id, recorded_at, \
             resulting_balance FROM points_transactions WHERE user_id = $1 ORDER BY sequence ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list points transactions", e))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| storage_error("Health check failed", e))
    }
}

/// A database transaction holding one user's advisory lock.
struct PgLedgerUnit {
    tx: Transaction<'static, Postgres>,
    user_id: UserId,
}

impl PgLedgerUnit {
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
impl LedgerUnit for PgLedgerUnit {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn account(&mut self) -> AppResult<Option<UserPointsAccount>> {
        sqlx::query_as::<_, UserPointsAccount>(
            "SELECT user_id, current_balance, transaction_count, updated_at \
             FROM points_accounts WHERE user_id = $1",
        )
        .bind(&self.user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| storage_error("Failed to read points account", e))
    }

    async fn insert_check_in(&mut self, record: &CheckInRecord) -> AppResult<bool> {
        self.ensure_owner(&record.user_id)?;

        let result = sqlx::query(
            "INSERT INTO check_ins (id, user_id, event_id, points_awarded, scanned_by, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, event_id) DO NOTHING",
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.event_id)
        .bind(record.points_awarded)
        .bind(&record.scanned_by)
        .bind(record.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("Failed to insert check-in", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn append(
        &mut self,
        transaction: &PointsTransaction,
        account: &UserPointsAccount,
    ) -> AppResult<()> {
        self.ensure_owner(&transaction.user_id)?;
        self.ensure_owner(&account.user_id)?;

        sqlx::query(
            "INSERT INTO points_transactions \
             (id, user_id, sequence, delta, reason_type, reference_id, recorded_at, resulting_balance) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(transaction.id)
        .bind(&transaction.user_id)
        .bind(transaction.sequence)
        .bind(transaction.delta)
        .bind(transaction.reason_type)
        .bind(&transaction.reference_id)
        .bind(transaction.recorded_at)
        .bind(transaction.resulting_balance)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("Failed to insert points transaction", e))?;

        sqlx::query(
            "INSERT INTO points_accounts (user_id, current_balance, transaction_count, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                current_balance = EXCLUDED.current_balance, \
                transaction_count = EXCLUDED.transaction_count, \
                updated_at = EXCLUDED.updated_at",
        )
        .bind(&account.user_id)
        .bind(account.current_balance)
        .bind(account.transaction_count)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| storage_error("Failed to update points account", e))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let PgLedgerUnit { tx, user_id } = *self;
        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit ledger transaction", e))?;
        debug!(user_id = %user_id, "Ledger unit committed");
        Ok(())
    }
}
