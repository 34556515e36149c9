//! The player: coin balance, position and path history.
//!
//! The balance changes only through the [`CoinWallet`] hooks the cache store
//! calls during a transfer. Every completed move appends exactly one entry to
//! the path.

use geocoin_types::{Direction, LatLng, PlayerState};
use geocoin_world::CoinWallet;

/// Mutable player state plus the fixed movement parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSession {
    coins: u32,
    position: LatLng,
    path: Vec<LatLng>,
    start: LatLng,
    step: f64,
}

impl PlayerSession {
    /// A player standing at `start` with no coins, moving `step` degrees per
    /// move.
    pub const fn new(start: LatLng, step: f64) -> Self {
        Self {
            coins: 0,
            position: start,
            path: Vec::new(),
            start,
            step,
        }
    }

    /// Coins carried.
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    /// Current position.
    pub const fn position(&self) -> LatLng {
        self.position
    }

    /// Positions reached by completed moves, oldest first.
    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    /// Where the player starts and returns to on reset.
    pub const fn start(&self) -> LatLng {
        self.start
    }

    /// Degrees moved per step.
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Move one configured step in `direction` and return the new position.
    pub fn move_by(&mut self, direction: Direction) -> LatLng {
        self.move_distance(direction, self.step)
    }

    /// Move `distance` degrees in `direction` and return the new position.
    ///
    /// No bounds are enforced; latitude may leave `[-90, 90]`.
    pub fn move_distance(&mut self, direction: Direction, distance: f64) -> LatLng {
        self.position = self.position.step(direction, distance);
        self.path.push(self.position);
        self.position
    }

    /// Snapshot of the observable state.
    pub fn state(&self) -> PlayerState {
        PlayerState {
            coins: self.coins,
            position: self.position,
            path: self.path.clone(),
        }
    }

    /// Set balance and path verbatim. The position becomes the last path
    /// entry, or the start position for an empty path.
    pub fn restore(&mut self, coins: u32, path: Vec<LatLng>) {
        self.coins = coins;
        self.position = path.last().copied().unwrap_or(self.start);
        self.path = path;
    }

    /// Back to the start with no coins and no history.
    pub fn reset(&mut self) {
        self.coins = 0;
        self.position = self.start;
        self.path.clear();
    }
}

impl CoinWallet for PlayerSession {
    fn balance(&self) -> u32 {
        self.coins
    }

    fn record_collect(&mut self) -> bool {
        self.coins.record_collect()
    }

    fn record_deposit(&mut self) -> bool {
        self.coins.record_deposit()
    }
}
