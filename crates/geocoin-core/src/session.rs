//! The game session: one explicit context owning world, player and storage.
//!
//! Every state-mutating action is write-through. After a successful move,
//! collect, deposit, restore, or a sweep that minted new caches, the full
//! snapshot is flushed to the durable store before the call returns.
//!
//! # Lifecycle
//!
//! [`GameSession::open`] loads the stored snapshot (if any), restores it,
//! sweeps the window around the player and flushes once. [`GameSession::reset`]
//! clears the durable store and the world, then sweeps again from the start
//! position.

use geocoin_db::{KeyValueStore, SnapshotStore};
use geocoin_types::{Cache, Cell, CellBounds, Direction, GameSnapshot, LatLng, PlayerState};
use geocoin_world::{
    Arc4Luck, CacheWorldStore, ConservationResult, GridMapper, Neighborhood, SpawnOutcome,
    ValueSource, verify_supply,
};
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::SessionError;
use crate::player::PlayerSession;

/// The running game.
#[derive(Debug)]
pub struct GameSession<S, L = Arc4Luck> {
    grid: GridMapper,
    world: CacheWorldStore,
    player: PlayerSession,
    snapshots: SnapshotStore<S>,
    luck: L,
    neighborhood_size: u32,
    /// Coins created by spawns since the world began.
    minted: u64,
}

impl<S: KeyValueStore, L: ValueSource> GameSession<S, L> {
    /// Build an empty session without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::World`] if the configured grid or spawn rules
    /// are invalid.
    pub fn new(config: &GameConfig, store: S, luck: L) -> Result<Self, SessionError> {
        let grid = config.grid_mapper()?;
        let rules = config.spawn_rules()?;
        Ok(Self {
            grid,
            world: CacheWorldStore::new(rules),
            player: PlayerSession::new(config.start_position(), config.player.step_degrees),
            snapshots: SnapshotStore::with_key(store, config.storage.key.clone()),
            luck,
            neighborhood_size: config.spawn.neighborhood_size,
            minted: 0,
        })
    }

    /// Start a session: load and restore the stored snapshot, sweep the
    /// player's window and flush.
    ///
    /// A missing or unreadable snapshot starts a fresh game.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::World`] for an invalid configuration, or
    /// [`SessionError::Storage`] if the initial flush fails.
    pub fn open(config: &GameConfig, store: S, luck: L) -> Result<Self, SessionError> {
        let mut session = Self::new(config, store, luck)?;
        let restored = match session.load() {
            Some(snapshot) => {
                session.apply_snapshot(snapshot);
                true
            }
            None => false,
        };

        let (visible, spawned) = session.sweep_window();
        session.flush()?;
        info!(
            restored,
            visible = visible.len(),
            spawned,
            coins = session.player.coins(),
            cell = %session.player_cell(),
            "Game session opened"
        );
        Ok(session)
    }

    // -------------------------------------------------------------------
    // World
    // -------------------------------------------------------------------

    /// Materialize `cell`: restore it from its memento, or apply the spawn
    /// rules. Returns the cache, if the cell hosts one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if a newly spawned cache could not be
    /// flushed.
    pub fn spawn_or_restore(&mut self, cell: Cell) -> Result<Option<Cache>, SessionError> {
        let outcome = self.materialize(cell);
        if matches!(outcome, SpawnOutcome::Spawned(_)) {
            self.flush()?;
        }
        Ok(outcome.cache())
    }

    /// Spawn or restore every cell in the window around the player and
    /// return the caches found there, in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if new caches were minted and the
    /// flush failed.
    pub fn sweep(&mut self) -> Result<Vec<Cache>, SessionError> {
        let (visible, spawned) = self.sweep_window();
        if spawned > 0 {
            self.flush()?;
        }
        Ok(visible)
    }

    /// The window of cells the next sweep will visit.
    pub fn neighborhood(&self) -> Neighborhood {
        Neighborhood::around(self.player_cell(), self.neighborhood_size)
    }

    /// Drop the in-memory cache for `cell`, keeping its memento.
    pub fn dematerialize(&mut self, cell: Cell) -> bool {
        self.world.dematerialize(cell)
    }

    /// The geographic rectangle of `cell`.
    pub fn cell_bounds(&self, cell: Cell) -> CellBounds {
        self.grid.bounds_of(cell)
    }

    /// The cell the player stands in.
    pub fn player_cell(&self) -> Cell {
        self.grid.cell_at(self.player.position())
    }

    /// The materialized cache at `cell`, if any.
    pub fn cache(&self, cell: Cell) -> Option<Cache> {
        self.world.cache(cell)
    }

    fn materialize(&mut self, cell: Cell) -> SpawnOutcome {
        let outcome = self.world.spawn_or_restore(cell, &self.luck);
        if let SpawnOutcome::Spawned(cache) = outcome {
            self.minted = self.minted.saturating_add(u64::from(cache.coin_count));
        }
        outcome
    }

    /// Sweep without flushing; returns the visible caches and how many were
    /// newly spawned.
    fn sweep_window(&mut self) -> (Vec<Cache>, usize) {
        let mut visible = Vec::new();
        let mut spawned: usize = 0;
        for cell in self.neighborhood() {
            match self.materialize(cell) {
                SpawnOutcome::Spawned(cache) => {
                    spawned = spawned.saturating_add(1);
                    visible.push(cache);
                }
                SpawnOutcome::Restored(cache) => visible.push(cache),
                SpawnOutcome::Empty => {}
            }
        }
        debug!(
            center = %self.player_cell(),
            visible = visible.len(),
            spawned,
            "Neighborhood swept"
        );
        (visible, spawned)
    }

    // -------------------------------------------------------------------
    // Player actions
    // -------------------------------------------------------------------

    /// Take one coin from the cache at `cell`.
    ///
    /// Returns `Ok(false)` if nothing moved.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the transfer happened but the
    /// flush failed.
    pub fn collect(&mut self, cell: Cell) -> Result<bool, SessionError> {
        let moved = self.world.collect(cell, &mut self.player);
        if moved {
            self.flush()?;
        }
        Ok(moved)
    }

    /// Put one coin into the cache at `cell`.
    ///
    /// Returns `Ok(false)` if nothing moved.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the transfer happened but the
    /// flush failed.
    pub fn deposit(&mut self, cell: Cell) -> Result<bool, SessionError> {
        let moved = self.world.deposit(cell, &mut self.player);
        if moved {
            self.flush()?;
        }
        Ok(moved)
    }

    /// Move the player one step in `direction` and return the new position.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the flush failed; the move still
    /// happened.
    pub fn move_player(&mut self, direction: Direction) -> Result<LatLng, SessionError> {
        let position = self.player.move_by(direction);
        debug!(%direction, lat = position.lat, lng = position.lng, "Player moved");
        self.flush()?;
        Ok(position)
    }

    /// The player.
    pub const fn player(&self) -> &PlayerSession {
        &self.player
    }

    /// Snapshot of the player's observable state.
    pub fn player_state(&self) -> PlayerState {
        self.player.state()
    }

    // -------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------

    /// The current state as a snapshot.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            player_coins: self.player.coins(),
            player_path: self.player.path().to_vec(),
            mementos: self.world.memento_map(),
        }
    }

    /// Write the current state to the durable store and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the write fails.
    pub fn save(&mut self) -> Result<GameSnapshot, SessionError> {
        let snapshot = self.snapshot();
        self.snapshots.save(&snapshot)?;
        Ok(snapshot)
    }

    /// Read the stored snapshot. Absent or unreadable payloads yield `None`.
    pub fn load(&self) -> Option<GameSnapshot> {
        self.snapshots.load()
    }

    /// Replace the current state with `snapshot` and flush it.
    ///
    /// Balance and path are taken verbatim, every memento is materialized,
    /// and the player stands at the last path entry (or the start).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the flush fails.
    pub fn restore(&mut self, snapshot: GameSnapshot) -> Result<(), SessionError> {
        self.apply_snapshot(snapshot);
        self.flush()
    }

    /// Load the stored snapshot and restore it. Returns `false` (and changes
    /// nothing) if there was no usable snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the flush fails.
    pub fn reload(&mut self) -> Result<bool, SessionError> {
        match self.load() {
            Some(snapshot) => {
                self.restore(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Wipe the durable store and all progress, then sweep from the start
    /// position. Returns the caches visible afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the store cannot be cleared or
    /// the final flush fails.
    pub fn reset(&mut self) -> Result<Vec<Cache>, SessionError> {
        self.snapshots.clear()?;
        self.world.clear();
        self.player.reset();
        self.minted = 0;
        let visible = self.sweep()?;
        info!(visible = visible.len(), minted = self.minted, "Game reset");
        Ok(visible)
    }

    /// The snapshot store wrapper.
    pub const fn snapshots(&self) -> &SnapshotStore<S> {
        &self.snapshots
    }

    /// The underlying key-value store.
    pub const fn store(&self) -> &S {
        self.snapshots.store()
    }

    /// Mutable access to the underlying key-value store.
    pub const fn store_mut(&mut self) -> &mut S {
        self.snapshots.store_mut()
    }

    /// End the session and hand back the key-value store.
    pub fn into_store(self) -> S {
        self.snapshots.into_inner()
    }

    fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        self.minted = snapshot.total_coins().unwrap_or_else(|| {
            warn!("Snapshot coin total overflows; conservation checks will fail");
            u64::MAX
        });

        self.world.clear();
        let caches = snapshot.mementos.len();
        for memento in snapshot.mementos.into_values() {
            self.world.restore_memento(memento);
        }
        self.player.restore(snapshot.player_coins, snapshot.player_path);
        debug!(caches, coins = self.player.coins(), "Snapshot applied");
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        self.save().map(|_| ())
    }

    // -------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------

    /// The world's cache store.
    pub const fn world(&self) -> &CacheWorldStore {
        &self.world
    }

    /// The grid mapper.
    pub const fn grid(&self) -> &GridMapper {
        &self.grid
    }

    /// Coins created by spawns since the world began or was restored.
    pub const fn minted(&self) -> u64 {
        self.minted
    }

    /// Check `balance + circulating == minted`.
    pub fn verify_conservation(&self) -> ConservationResult {
        let result = verify_supply(self.minted, self.player.coins(), &self.world);
        if let ConservationResult::Anomaly(anomaly) = &result {
            warn!(
                expected = anomaly.expected,
                actual = ?anomaly.actual,
                "{anomaly}"
            );
        }
        result
    }
}
