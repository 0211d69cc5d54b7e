//! Fixed allocation tiers.
//!
//! Exactly three discrete block-size classes, ordered small < medium <
//! large. The set is immutable once an allocator is built; there is no
//! dynamic tier creation and no best-fit across arbitrary sizes.

use std::fmt;

/// Number of fixed tiers.
pub const TIER_COUNT: usize = 3;

/// One of the three fixed block-size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Small,
    Medium,
    Large,
}

impl Tier {
    /// All tiers in increasing block-size order. Selection walks this array
    /// front to back.
    pub const ALL: [Tier; TIER_COUNT] = [Tier::Small, Tier::Medium, Tier::Large];

    /// Position of this tier in [`Tier::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Tier::Small => 0,
            Tier::Medium => 1,
            Tier::Large => 2,
        }
    }

    /// Lower-case tier name, stable for logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tier::Small => "small",
            Tier::Medium => "medium",
            Tier::Large => "large",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload capacities and block count for the three tiers.
///
/// Each tier's block size is its payload capacity plus the fixed header
/// size. The defaults reproduce the reference deployment: 64/256/1024-byte
/// payloads, 10 blocks per tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierConfig {
    /// Nominal payload capacity per tier, in increasing order.
    pub payload_capacities: [usize; TIER_COUNT],
    /// Number of blocks in every tier's pool.
    pub blocks_per_tier: usize,
}

impl TierConfig {
    /// True when the capacities are non-zero and strictly increasing and the
    /// block count is non-zero.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.blocks_per_tier > 0
            && self.payload_capacities[0] > 0
            && self.payload_capacities.windows(2).all(|w| w[0] < w[1])
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            payload_capacities: [64, 256, 1024],
            blocks_per_tier: 10,
        }
    }
}
