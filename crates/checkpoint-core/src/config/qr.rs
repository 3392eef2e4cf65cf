//! QR token configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// QR payload validity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    /// How long an issued payload stays valid, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// How far in the future an `issuedAt` may lie before the token is
    /// rejected, in seconds. Covers clock drift between devices.
    #[serde(default = "default_skew")]
    pub max_clock_skew_seconds: u64,
}

impl QrConfig {
    /// Time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Allowed clock skew as a [`Duration`].
    pub fn max_clock_skew(&self) -> Duration {
        Duration::from_secs(self.max_clock_skew_seconds)
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_clock_skew_seconds: default_skew(),
        }
    }
}

fn default_ttl() -> u64 {
    24 * 60 * 60
}

fn default_skew() -> u64 {
    300
}
