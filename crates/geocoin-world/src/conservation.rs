//! Coin conservation checks.
//!
//! Coins enter the world only when a cache spawns with no prior memento.
//! After that, collect and deposit move coins between the player and a cache
//! one at a time. For any quiescent state:
//!
//! ```text
//! player_balance + sum(memento.num_coins) == coins_minted
//! ```
//!
//! A violation produces a [`CoinAnomaly`]. Transfers keep the law by
//! construction; the check guards against corrupted snapshots and future
//! bugs.

use crate::cache_store::CacheWorldStore;

/// A conservation law violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinAnomaly {
    /// Coins that should exist.
    pub expected: u64,
    /// Coins actually found, or `None` if summing overflowed.
    pub actual: Option<u64>,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for CoinAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Player and caches together hold exactly the minted supply.
    Balanced,
    /// The supply does not add up.
    Anomaly(CoinAnomaly),
}

impl ConservationResult {
    /// Return `true` if the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify that `player_coins` plus every memento in `store` equals `minted`.
pub fn verify_supply(minted: u64, player_coins: u32, store: &CacheWorldStore) -> ConservationResult {
    let actual = store
        .circulating_coins()
        .and_then(|cached| cached.checked_add(u64::from(player_coins)));

    match actual {
        Some(total) if total == minted => ConservationResult::Balanced,
        Some(total) => ConservationResult::Anomaly(CoinAnomaly {
            expected: minted,
            actual: Some(total),
            message: format!("COIN_ANOMALY: expected {minted} coins in circulation, found {total}"),
        }),
        None => ConservationResult::Anomaly(CoinAnomaly {
            expected: minted,
            actual: None,
            message: "COIN_ANOMALY: arithmetic overflow while summing coins".to_owned(),
        }),
    }
}
