//! PostgreSQL user directory.

use async_trait::async_trait;
use sqlx::PgPool;

use checkpoint_core::result::AppResult;
use checkpoint_core::types::UserId;
use checkpoint_entity::user::UserProfile;

use super::storage_error;
use crate::store::UserDirectory;

/// Reads profiles from the shared `users` table.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT id, display_name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to find user", e))
    }
}
