//! Points award configuration.

use serde::{Deserialize, Serialize};

/// Points settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Points awarded for a check-in when neither the organizer nor the
    /// payload specifies an amount.
    #[serde(default = "default_reward")]
    pub default_reward: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            default_reward: default_reward(),
        }
    }
}

fn default_reward() -> i64 {
    10
}
