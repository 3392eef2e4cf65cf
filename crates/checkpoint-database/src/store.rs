//! Ledger storage traits.

use std::fmt;

use async_trait::async_trait;

use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, UserPointsAccount};
use checkpoint_entity::user::UserProfile;

/// Durable storage for check-ins, transactions, and accounts.
///
/// All writes go through a [`LedgerUnit`] obtained from [`LedgerStore::begin`].
/// A unit is scoped to one user and holds that user's ledger lock until it
/// is committed or dropped, so units for the same user run one at a time
/// while units for different users never wait on each other.
///
/// Reads on the store itself only ever see committed units. A check-in and
/// the transaction written in the same unit become visible together.
#[async_trait]
pub trait LedgerStore: Send + Sync + fmt::Debug + 'static {
    /// Open a unit of work for `user_id`, waiting for any unit already
    /// open for the same user.
    async fn begin(&self, user_id: &UserId) -> AppResult<Box<dyn LedgerUnit>>;

    /// Committed check-in for the pair, if any.
    async fn find_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> AppResult<Option<CheckInRecord>>;

    /// All committed check-ins for an event, oldest first.
    async fn list_check_ins(&self, event_id: &EventId) -> AppResult<Vec<CheckInRecord>>;

    /// Committed account for a user, if the user has any transactions.
    async fn find_account(&self, user_id: &UserId) -> AppResult<Option<UserPointsAccount>>;

    /// All committed transactions for a user in sequence order.
    async fn list_transactions(&self, user_id: &UserId) -> AppResult<Vec<PointsTransaction>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// An all-or-nothing batch of writes against one user's ledger.
///
/// Dropping a unit without calling [`LedgerUnit::commit`] discards every
/// write made through it.
#[async_trait]
pub trait LedgerUnit: Send {
    /// The user this unit is scoped to.
    fn user_id(&self) -> &UserId;

    /// The account as seen inside this unit, including its own appends.
    async fn account(&mut self) -> AppResult<Option<UserPointsAccount>>;

    /// Insert a check-in. Returns `false` without writing if a record for
    /// the same `(user_id, event_id)` already exists.
    async fn insert_check_in(&mut self, record: &CheckInRecord) -> AppResult<bool>;

    /// Append a transaction and store the account state it produces.
    async fn append(
        &mut self,
        transaction: &PointsTransaction,
        account: &UserPointsAccount,
    ) -> AppResult<()>;

    /// Make every write in this unit visible at once.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Resolves user identities owned by an external account service.
#[async_trait]
pub trait UserDirectory: Send + Sync + fmt::Debug + 'static {
    /// Look up a user's profile.
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<UserProfile>>;
}
