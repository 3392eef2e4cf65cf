//! Loyalty tier derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Loyalty tier, ordered `Bronze < Silver < Gold < Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Below 100 points.
    Bronze,
    /// 100 points or more.
    Silver,
    /// 500 points or more.
    Gold,
    /// 2000 points or more.
    Platinum,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];

    /// Minimum balance for this tier.
    pub fn threshold(&self) -> i64 {
        match self {
            Self::Bronze => 0,
            Self::Silver => 100,
            Self::Gold => 500,
            Self::Platinum => 2000,
        }
    }

    /// The tier above this one, if any.
    pub fn next(&self) -> Option<Tier> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => None,
        }
    }

    /// Return the tier as a display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier for a balance. Total over `i64`; negative balances are Bronze.
pub fn tier_for(balance: i64) -> Tier {
    Tier::ALL
        .into_iter()
        .rev()
        .find(|tier| balance >= tier.threshold())
        .unwrap_or(Tier::Bronze)
}

/// Points still needed to reach the next tier, or `None` at the top.
pub fn points_to_next_tier(balance: i64) -> Option<i64> {
    tier_for(balance)
        .next()
        .map(|next| next.threshold() - balance)
}
