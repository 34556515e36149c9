//! Grid, seeded generation, and the cache economy for the GeoCoin game.
//!
//! This crate models the world: a discrete grid laid over geographic space,
//! caches that appear deterministically in some of its cells, and the
//! one-coin transfers between a cache and the player.
//!
//! # Modules
//!
//! - [`cache_store`] -- [`CacheWorldStore`]: spawn decisions, mementos,
//!   collect and deposit.
//! - [`conservation`] -- Coin supply verification.
//! - [`error`] -- Error types for world construction.
//! - [`grid`] -- [`GridMapper`]: positions to cells and back.
//! - [`luck`] -- [`ValueSource`] trait and the deterministic [`Arc4Luck`].
//! - [`neighborhood`] -- The square window of cells a view asks about.

pub mod cache_store;
pub mod conservation;
pub mod error;
pub mod grid;
pub mod luck;
pub mod neighborhood;

// Re-export primary types at crate root.
pub use cache_store::{
    CacheWorldStore, CoinWallet, DEFAULT_MAX_INITIAL_COINS, DEFAULT_SPAWN_PROBABILITY,
    SpawnOutcome, SpawnRules,
};
pub use conservation::{CoinAnomaly, ConservationResult, verify_supply};
pub use error::WorldError;
pub use grid::{DEFAULT_CELLS_PER_DEGREE, DEFAULT_ORIGIN, GridMapper};
pub use luck::{Arc4Luck, TableLuck, ValueSource};
pub use neighborhood::Neighborhood;
