//! Core entity structs: caches, their mementos, player state and snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cell::Cell;
use crate::geo::LatLng;

/// A materialized coin cache anchored to one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Cache {
    /// The cell this cache belongs to.
    pub cell: Cell,
    /// Coins currently held by the cache.
    pub coin_count: u32,
}

impl Cache {
    /// Create a cache at `cell` holding `coin_count` coins.
    pub const fn new(cell: Cell, coin_count: u32) -> Self {
        Self { cell, coin_count }
    }
}

/// Durable record of one cache's state.
///
/// Serializes to the exact text `{"i":0,"j":0,"numCoins":29}`, which is
/// what the snapshot stores as each cache's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CacheMemento {
    /// Row of the cache's cell.
    pub i: i32,
    /// Column of the cache's cell.
    pub j: i32,
    /// Coins held at the time the memento was written.
    pub num_coins: u32,
}

impl CacheMemento {
    /// The cell this memento describes.
    pub const fn cell(&self) -> Cell {
        Cell::new(self.i, self.j)
    }

    /// Encode as memento JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode memento JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl From<Cache> for CacheMemento {
    fn from(cache: Cache) -> Self {
        Self {
            i: cache.cell.i,
            j: cache.cell.j,
            num_coins: cache.coin_count,
        }
    }
}

impl From<CacheMemento> for Cache {
    fn from(memento: CacheMemento) -> Self {
        Self {
            cell: memento.cell(),
            coin_count: memento.num_coins,
        }
    }
}

/// The player's observable state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerState {
    /// Coins carried by the player.
    pub coins: u32,
    /// Current position.
    pub position: LatLng,
    /// Every position reached by a completed move, oldest first.
    pub path: Vec<LatLng>,
}

/// Geographic rectangle covered by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CellBounds {
    /// Corner with the smallest latitude and longitude.
    pub south_west: LatLng,
    /// Corner with the largest latitude and longitude.
    pub north_east: LatLng,
}

/// Full persisted game state: the player plus every cache memento.
///
/// This is the in-memory form. The storage layer owns the wire encoding and
/// its version tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameSnapshot {
    /// Player coin balance.
    pub player_coins: u32,
    /// Player path history, oldest first.
    pub player_path: Vec<LatLng>,
    /// All mementos, keyed by cell.
    pub mementos: BTreeMap<Cell, CacheMemento>,
}

impl GameSnapshot {
    /// Return `true` if the snapshot carries no player or cache state.
    pub fn is_empty(&self) -> bool {
        self.player_coins == 0 && self.player_path.is_empty() && self.mementos.is_empty()
    }

    /// Sum of the player balance and every memento's coin count.
    ///
    /// Returns `None` on overflow.
    pub fn total_coins(&self) -> Option<u64> {
        let mut total = u64::from(self.player_coins);
        for memento in self.mementos.values() {
            total = total.checked_add(u64::from(memento.num_coins))?;
        }
        Some(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memento_json_matches_storage_format() {
        let memento = CacheMemento { i: 0, j: 0, num_coins: 29 };
        assert_eq!(memento.to_json().unwrap(), r#"{"i":0,"j":0,"numCoins":29}"#);
    }

    #[test]
    fn memento_rejects_negative_coins() {
        assert!(CacheMemento::from_json(r#"{"i":0,"j":0,"numCoins":-1}"#).is_err());
    }

    #[test]
    fn cache_and_memento_convert_both_ways() {
        let cache = Cache::new(Cell::new(-4, 9), 12);
        let memento = CacheMemento::from(cache);
        assert_eq!(memento.cell(), Cell::new(-4, 9));
        assert_eq!(Cache::from(memento), cache);
    }

    #[test]
    fn snapshot_totals_include_player_and_caches() {
        let mut snapshot = GameSnapshot {
            player_coins: 3,
            ..GameSnapshot::default()
        };
        snapshot
            .mementos
            .insert(Cell::new(0, 0), CacheMemento { i: 0, j: 0, num_coins: 10 });
        snapshot
            .mementos
            .insert(Cell::new(1, 0), CacheMemento { i: 1, j: 0, num_coins: 7 });
        assert_eq!(snapshot.total_coins(), Some(20));
        assert!(!snapshot.is_empty());
        assert!(GameSnapshot::default().is_empty());
    }
}
