//! The cache world store: spawn decisions, mementos and coin transfers.
//!
//! The store answers per-cell questions only. It never knows which window
//! the view is showing; it only tracks which cells carry a memento and
//! which of those are currently materialized as a [`Cache`].
//!
//! # Materialization
//!
//! [`CacheWorldStore::spawn_or_restore`] resolves a cell in this order:
//!
//! 1. A memento exists: the cache is rebuilt verbatim from it.
//! 2. `value_for(spawn_key) < probability`: the cache spawns with
//!    `floor(value_for(initial_coins_key) * max_initial_coins)` coins and a
//!    memento is written at once. This is the only place coins are created.
//! 3. Otherwise the cell stays unspawned.
//!
//! # Transfers
//!
//! [`collect`](CacheWorldStore::collect) and
//! [`deposit`](CacheWorldStore::deposit) move exactly one coin between a
//! cache and a [`CoinWallet`]. Both sides are checked before either is
//! touched, and the memento is rewritten in the same call, so a transfer is
//! either fully applied or not at all.

use std::collections::BTreeMap;

use geocoin_types::{Cache, CacheMemento, Cell};
use tracing::debug;

use crate::error::WorldError;
use crate::luck::ValueSource;

/// Default fraction of cells that host a cache.
pub const DEFAULT_SPAWN_PROBABILITY: f64 = 0.1;

/// Default exclusive upper bound on a fresh cache's coin count.
pub const DEFAULT_MAX_INITIAL_COINS: u32 = 50;

/// Thresholds for procedural cache generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRules {
    probability: f64,
    max_initial_coins: u32,
}

impl SpawnRules {
    /// Create spawn rules.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidSpawnRule`] unless `probability` is in
    /// `[0, 1]`.
    pub fn new(probability: f64, max_initial_coins: u32) -> Result<Self, WorldError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(WorldError::InvalidSpawnRule { probability });
        }
        Ok(Self {
            probability,
            max_initial_coins,
        })
    }

    /// Spawn threshold.
    pub const fn probability(&self) -> f64 {
        self.probability
    }

    /// Exclusive upper bound on initial coins.
    pub const fn max_initial_coins(&self) -> u32 {
        self.max_initial_coins
    }

    /// Whether `cell` hosts a cache when it has no memento.
    pub fn should_spawn(&self, luck: &impl ValueSource, cell: Cell) -> bool {
        luck.value_for(&cell.spawn_key()) < self.probability
    }

    /// Procedural starting coin count for `cell`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn initial_coins(&self, luck: &impl ValueSource, cell: Cell) -> u32 {
        let scaled = luck.value_for(&cell.initial_coins_key()) * f64::from(self.max_initial_coins);
        // Saturating cast: a value source straying below zero yields 0.
        scaled.floor() as u32
    }
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self {
            probability: DEFAULT_SPAWN_PROBABILITY,
            max_initial_coins: DEFAULT_MAX_INITIAL_COINS,
        }
    }
}

/// The player side of a coin transfer.
pub trait CoinWallet {
    /// Coins currently held.
    fn balance(&self) -> u32;

    /// Add one collected coin. Returns `false`, unchanged, on overflow.
    fn record_collect(&mut self) -> bool;

    /// Remove one deposited coin. Returns `false`, unchanged, when empty.
    fn record_deposit(&mut self) -> bool;
}

impl CoinWallet for u32 {
    fn balance(&self) -> u32 {
        *self
    }

    fn record_collect(&mut self) -> bool {
        match self.checked_add(1) {
            Some(next) => {
                *self = next;
                true
            }
            None => false,
        }
    }

    fn record_deposit(&mut self) -> bool {
        match self.checked_sub(1) {
            Some(next) => {
                *self = next;
                true
            }
            None => false,
        }
    }
}

/// How a cell resolved in [`CacheWorldStore::spawn_or_restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// Rebuilt from an existing memento.
    Restored(Cache),
    /// Freshly generated; its coins were minted by this call.
    Spawned(Cache),
    /// The cell hosts no cache.
    Empty,
}

impl SpawnOutcome {
    /// The materialized cache, if any.
    pub const fn cache(self) -> Option<Cache> {
        match self {
            Self::Restored(cache) | Self::Spawned(cache) => Some(cache),
            Self::Empty => None,
        }
    }
}

/// Owns every memento and every materialized cache.
#[derive(Debug, Clone, Default)]
pub struct CacheWorldStore {
    rules: SpawnRules,
    mementos: BTreeMap<Cell, CacheMemento>,
    caches: BTreeMap<Cell, Cache>,
}

impl CacheWorldStore {
    /// Create an empty store using `rules` for procedural generation.
    pub const fn new(rules: SpawnRules) -> Self {
        Self {
            rules,
            mementos: BTreeMap::new(),
            caches: BTreeMap::new(),
        }
    }

    /// The store's spawn rules.
    pub const fn rules(&self) -> &SpawnRules {
        &self.rules
    }

    // -------------------------------------------------------------------
    // Materialization
    // -------------------------------------------------------------------

    /// Materialize the cache for `cell`, restoring from its memento when one
    /// exists and otherwise applying the spawn rules.
    pub fn spawn_or_restore(&mut self, cell: Cell, luck: &impl ValueSource) -> SpawnOutcome {
        if let Some(memento) = self.mementos.get(&cell) {
            let cache = Cache::from(*memento);
            self.caches.insert(cell, cache);
            debug!(%cell, coins = cache.coin_count, "Cache restored from memento");
            return SpawnOutcome::Restored(cache);
        }

        if !self.rules.should_spawn(luck, cell) {
            return SpawnOutcome::Empty;
        }

        let cache = Cache::new(cell, self.rules.initial_coins(luck, cell));
        self.write_through(cache);
        debug!(%cell, coins = cache.coin_count, "Cache spawned");
        SpawnOutcome::Spawned(cache)
    }

    /// Install `memento` and materialize its cache immediately.
    ///
    /// Any existing state for the memento's cell is replaced.
    pub fn restore_memento(&mut self, memento: CacheMemento) -> Cache {
        let cache = Cache::from(memento);
        self.write_through(cache);
        cache
    }

    /// Drop the in-memory cache for `cell`, keeping its memento.
    ///
    /// Returns `true` if a cache was materialized.
    pub fn dematerialize(&mut self, cell: Cell) -> bool {
        self.caches.remove(&cell).is_some()
    }

    /// Drop every memento and every materialized cache.
    pub fn clear(&mut self) {
        self.mementos.clear();
        self.caches.clear();
    }

    // -------------------------------------------------------------------
    // Transfers
    // -------------------------------------------------------------------

    /// Move one coin from the cache at `cell` into `wallet`.
    ///
    /// Returns `false` without changing anything if the cell has no cache,
    /// the cache is empty, or the wallet cannot take another coin.
    pub fn collect(&mut self, cell: Cell, wallet: &mut impl CoinWallet) -> bool {
        let Some(current) = self.coin_count(cell) else {
            debug!(%cell, "Collect on unspawned cell ignored");
            return false;
        };
        let Some(remaining) = current.checked_sub(1) else {
            return false;
        };
        if !wallet.record_collect() {
            return false;
        }

        self.write_through(Cache::new(cell, remaining));
        debug!(%cell, remaining, balance = wallet.balance(), "Coin collected");
        true
    }

    /// Move one coin from `wallet` into the cache at `cell`.
    ///
    /// Returns `false` without changing anything if the cell has no cache,
    /// the wallet is empty, or the cache cannot take another coin.
    pub fn deposit(&mut self, cell: Cell, wallet: &mut impl CoinWallet) -> bool {
        let Some(current) = self.coin_count(cell) else {
            debug!(%cell, "Deposit on unspawned cell ignored");
            return false;
        };
        if wallet.balance() == 0 {
            return false;
        }
        let Some(held) = current.checked_add(1) else {
            return false;
        };
        if !wallet.record_deposit() {
            return false;
        }

        self.write_through(Cache::new(cell, held));
        debug!(%cell, held, balance = wallet.balance(), "Coin deposited");
        true
    }

    /// Update the cache and its memento together.
    fn write_through(&mut self, cache: Cache) {
        self.caches.insert(cache.cell, cache);
        self.mementos.insert(cache.cell, CacheMemento::from(cache));
    }

    /// Current coin count for `cell`, materialized or memento-only.
    fn coin_count(&self, cell: Cell) -> Option<u32> {
        self.caches
            .get(&cell)
            .map(|cache| cache.coin_count)
            .or_else(|| self.mementos.get(&cell).map(|memento| memento.num_coins))
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// The materialized cache at `cell`, if any.
    pub fn cache(&self, cell: Cell) -> Option<Cache> {
        self.caches.get(&cell).copied()
    }

    /// The memento for `cell`, if one was ever written.
    pub fn memento(&self, cell: Cell) -> Option<&CacheMemento> {
        self.mementos.get(&cell)
    }

    /// Return `true` if `cell` is currently materialized.
    pub fn is_materialized(&self, cell: Cell) -> bool {
        self.caches.contains_key(&cell)
    }

    /// Iterate all materialized caches in cell order.
    pub fn caches(&self) -> impl Iterator<Item = &Cache> {
        self.caches.values()
    }

    /// Iterate all mementos in cell order.
    pub fn mementos(&self) -> impl Iterator<Item = (&Cell, &CacheMemento)> {
        self.mementos.iter()
    }

    /// Copy of the full memento map, for snapshotting.
    pub fn memento_map(&self) -> BTreeMap<Cell, CacheMemento> {
        self.mementos.clone()
    }

    /// Number of mementos held.
    pub fn memento_count(&self) -> usize {
        self.mementos.len()
    }

    /// Number of materialized caches.
    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }

    /// Sum of coins over every memento.
    ///
    /// Returns `None` on overflow.
    pub fn circulating_coins(&self) -> Option<u64> {
        let mut total: u64 = 0;
        for memento in self.mementos.values() {
            total = total.checked_add(u64::from(memento.num_coins))?;
        }
        Some(total)
    }
}
