//! User profile model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use checkpoint_core::types::UserId;

/// The minimal identity shown to an organizer after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Human-readable name.
    pub display_name: String,
}

impl UserProfile {
    /// Creates a new profile.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
