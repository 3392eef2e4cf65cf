//! In-memory user directory.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use checkpoint_core::result::AppResult;
use checkpoint_core::types::UserId;
use checkpoint_entity::user::UserProfile;

use crate::store::UserDirectory;

/// User directory backed by a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<DashMap<UserId, UserProfile>>,
}

impl MemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory holding the given profiles.
    pub fn with_users(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let directory = Self::new();
        for profile in profiles {
            directory.insert(profile);
        }
        directory
    }

    /// Adds or replaces a profile.
    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_user(&self, user_id: &UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.users.get(user_id).map(|entry| entry.value().clone()))
    }
}
