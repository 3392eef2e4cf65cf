//! User directory configuration.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Profiles preloaded into the in-memory user directory.
///
/// Ignored by the PostgreSQL backend, which reads the `users` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Seed profiles.
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// One preloaded profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    /// User identifier.
    pub id: UserId,
    /// Human-readable name.
    pub display_name: String,
}
