//! Backend selection for the ledger store and user directory.

use async_trait::async_trait;
use tracing::info;

use checkpoint_core::config::{AppConfig, StorageBackend};
use checkpoint_core::result::AppResult;
use checkpoint_core::types::{EventId, UserId};
use checkpoint_entity::checkin::CheckInRecord;
use checkpoint_entity::points::{PointsTransaction, UserPointsAccount};
use checkpoint_entity::user::UserProfile;

use crate::memory::{MemoryLedgerStore, MemoryUserDirectory};
use crate::pool;
use crate::repositories::{PgLedgerStore, PgUserDirectory};
use crate::store::{LedgerStore, LedgerUnit, UserDirectory};

/// Dispatcher for ledger storage strategies.
///
/// Switches between in-memory and PostgreSQL storage based on configuration.
#[derive(Debug, Clone)]
pub enum LedgerStoreDispatch {
    /// In-memory store (single node).
    Memory(MemoryLedgerStore),
    /// PostgreSQL store (shared across nodes).
    Postgres(PgLedgerStore),
}

/// Dispatcher for user directory strategies.
#[derive(Debug, Clone)]
pub enum DirectoryDispatch {
    /// Profiles seeded from configuration.
    Memory(MemoryUserDirectory),
    /// Profiles read from the `users` table.
    Postgres(PgUserDirectory),
}

/// Build both backends from configuration, connecting and migrating the
/// database when the PostgreSQL backend is selected.
pub async fn connect(config: &AppConfig) -> AppResult<(LedgerStoreDispatch, DirectoryDispatch)> {
    match config.database.backend {
        StorageBackend::Memory => {
            info!(
                seeded_users = config.directory.users.len(),
                "Using in-memory ledger store"
            );
            let directory = MemoryUserDirectory::with_users(
                config
                    .directory
                    .users
                    .iter()
                    .map(|seed| UserProfile::new(seed.id.clone(), seed.display_name.clone())),
            );
            Ok((
                LedgerStoreDispatch::Memory(MemoryLedgerStore::new()),
                DirectoryDispatch::Memory(directory),
            ))
        }
        StorageBackend::Postgres => {
            let pool = pool::open(&config.database).await?;
            Ok((
                LedgerStoreDispatch::Postgres(PgLedgerStore::new(pool.clone())),
                DirectoryDispatch::Postgres(PgUserDirectory::new(pool)),
            ))
        }
    }
}

#[async_trait]
impl LedgerStore for LedgerStoreDispatch {
    async fn begin(&self, user_id: &UserId) -> AppResult<Box<dyn LedgerUnit>> {
        match self {
            Self::Memory(store) => store.begin(user_id).await,
            Self::Postgres(store) => store.begin(user_id).await,
        }
    }

    async fn find_check_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> AppResult<Option<CheckInRecord>> {
        match self {
            Self::Memory(store) => store.find_check_in(user_id, event_id).await,
            Self::Postgres(store) => store.find_check_in(user_id, event_id).await,
        }
    }

    async fn list_check_ins(&self, event_id: &EventId) -> AppResult<Vec<CheckInRecord>> {
        match self {
            Self::Memory(store) => store.list_check_ins(event_id).await,
            Self::Postgres(store) => store.list_check_ins(event_id).await,
        }
    }

    async fn find_account(&self, user_id: &UserId) -> AppResult<Option<UserPointsAccount>> {
        match self {
            Self::Memory(store) => store.find_account(user_id).await,
            Self::Postgres(store) => store.find_account(user_id).await,
        }
    }

    async fn list_transactions(&self, user_id: &UserId) -> AppResult<Vec<PointsTransaction>> {
        match self {
            Self::Memory(store) => store.list_transactions(user_id).await,
            Self::Postgres(store) => store.list_transactions(user_id).await,
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self {
            Self::Memory(store) => store.health_check().await,
            Self::Postgres(store) => store.health_check().await,
        }
    }
}

#[async_trait]
impl UserDirectory for DirectoryDispatch {
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<UserProfile>> {
        match self {
            Self::Memory(directory) => directory.find_user(user_id).await,
            Self::Postgres(directory) => directory.find_user(user_id).await,
        }
    }
}
