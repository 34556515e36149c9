//! End-to-end session behavior: persistence across restarts, reset, and
//! storage failures.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use geocoin_core::{GameConfig, GameSession, SessionError};
use geocoin_db::{DbError, FileStore, KeyValueStore, MemoryStore, SNAPSHOT_KEY};
use geocoin_types::{Cell, Direction, LatLng};
use geocoin_world::{Arc4Luck, DEFAULT_ORIGIN, TableLuck};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Only `(0, 0)` spawns, with `floor(0.6 * 50) = 30` coins.
fn scenario_luck() -> TableLuck {
    TableLuck::new(0.99)
        .with("0,0", 0.05)
        .with("0,0,initialCoins", 0.6)
}

fn zero_origin_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.grid.origin = LatLng::new(0.0, 0.0);
    config
}

fn stored_payload(store: &impl KeyValueStore) -> serde_json::Value {
    serde_json::from_str(&store.get(SNAPSHOT_KEY).unwrap().unwrap()).unwrap()
}

/// A store whose writes can be made to fail.
#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), DbError> {
        if self.failing {
            return Err(DbError::io(
                "flaky",
                std::io::Error::other("disk unavailable"),
            ));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), DbError> {
        self.inner.remove(key)
    }

    fn clear(&mut self) -> Result<(), DbError> {
        self.inner.clear()
    }
}

#[test]
fn collect_writes_the_documented_memento() {
    let mut session =
        GameSession::open(&zero_origin_config(), MemoryStore::new(), scenario_luck()).unwrap();
    assert_eq!(session.cache(Cell::ORIGIN).unwrap().coin_count, 30);

    assert!(session.collect(Cell::ORIGIN).unwrap());
    assert_eq!(session.cache(Cell::ORIGIN).unwrap().coin_count, 29);
    assert_eq!(session.player().coins(), 1);

    let payload = stored_payload(session.store());
    assert_eq!(payload["playerCoins"], 1);
    assert_eq!(payload["cacheStates"][0][0], "0:0");
    assert_eq!(payload["cacheStates"][0][1], r#"{"i":0,"j":0,"numCoins":29}"#);
}

#[test]
fn progress_survives_a_restart() {
    let config = zero_origin_config();
    let mut session = GameSession::open(&config, MemoryStore::new(), scenario_luck()).unwrap();
    for _ in 0..3 {
        assert!(session.collect(Cell::ORIGIN).unwrap());
    }
    let position = session.move_player(Direction::North).unwrap();
    let store = session.into_store();

    let reopened = GameSession::open(&config, store, scenario_luck()).unwrap();
    assert_eq!(reopened.player().coins(), 3);
    assert_eq!(reopened.player().position(), position);
    assert_eq!(reopened.player().path(), &[position]);
    assert_eq!(reopened.cache(Cell::ORIGIN).unwrap().coin_count, 27);
    assert!(reopened.verify_conservation().is_balanced());
}

#[test]
fn memento_beats_procedural_generation_after_restart() {
    let config = zero_origin_config();
    let mut session = GameSession::open(&config, MemoryStore::new(), scenario_luck()).unwrap();
    assert!(session.collect(Cell::ORIGIN).unwrap());
    let store = session.into_store();

    // Different luck now would spawn 45 coins; the memento wins.
    let other_luck = TableLuck::new(0.99)
        .with("0,0", 0.05)
        .with("0,0,initialCoins", 0.9);
    let reopened = GameSession::open(&config, store, other_luck).unwrap();
    assert_eq!(reopened.cache(Cell::ORIGIN).unwrap().coin_count, 29);
}

#[test]
fn restore_of_save_reproduces_state() {
    let mut session =
        GameSession::open(&zero_origin_config(), MemoryStore::new(), scenario_luck()).unwrap();
    session.collect(Cell::ORIGIN).unwrap();
    session.move_player(Direction::East).unwrap();
    let saved = session.save().unwrap();

    session.collect(Cell::ORIGIN).unwrap();
    session.move_player(Direction::West).unwrap();
    session.restore(saved.clone()).unwrap();

    assert_eq!(session.snapshot(), saved);
    assert_eq!(session.player().position(), saved.player_path[0]);
    assert_eq!(session.cache(Cell::ORIGIN).unwrap().coin_count, 29);
}

#[test]
fn reload_ignores_missing_payload() {
    let mut session =
        GameSession::new(&zero_origin_config(), MemoryStore::new(), scenario_luck()).unwrap();
    assert!(!session.reload().unwrap());
    assert!(session.store().is_empty());
}

#[test]
fn reset_wipes_progress_and_resweeps() {
    let mut session =
        GameSession::open(&zero_origin_config(), MemoryStore::new(), scenario_luck()).unwrap();
    session.collect(Cell::ORIGIN).unwrap();
    session.move_player(Direction::South).unwrap();
    session.store_mut().set("unrelated", "x").unwrap();

    let visible = session.reset().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].coin_count, 30);
    assert_eq!(session.player().coins(), 0);
    assert!(session.player().path().is_empty());
    assert_eq!(session.player().position(), LatLng::new(0.0, 0.0));
    assert_eq!(session.minted(), 30);

    assert_eq!(session.store().get("unrelated").unwrap(), None);
    assert_eq!(stored_payload(session.store())["playerCoins"], 0);
}

#[test]
fn malformed_payload_starts_a_fresh_game() {
    let store = MemoryStore::with_entry(SNAPSHOT_KEY, "{\"playerCoins\": oops");
    let session = GameSession::open(&zero_origin_config(), store, scenario_luck()).unwrap();
    assert_eq!(session.player().coins(), 0);
    assert_eq!(session.cache(Cell::ORIGIN).unwrap().coin_count, 30);

    // The fresh state replaced the unreadable payload.
    assert_eq!(session.load().unwrap(), session.snapshot());
}

#[test]
fn legacy_payload_is_restored() {
    let legacy = r#"{
        "playerCoins": 4,
        "cacheStates": [["0:0", "{\"i\":0,\"j\":0,\"numCoins\":26}"]],
        "playerPath": [{"lat": 0.00005, "lng": 0.00005}]
    }"#;
    let store = MemoryStore::with_entry(SNAPSHOT_KEY, legacy);
    let session = GameSession::open(&zero_origin_config(), store, scenario_luck()).unwrap();

    assert_eq!(session.player().coins(), 4);
    assert_eq!(session.cache(Cell::ORIGIN).unwrap().coin_count, 26);
    assert_eq!(session.player_cell(), Cell::ORIGIN);
    assert_eq!(stored_payload(session.store())["version"], 1);
}

#[test]
fn rejected_actions_do_not_write() {
    let store = FlakyStore::default();
    let mut session = GameSession::open(&zero_origin_config(), store, scenario_luck()).unwrap();
    session.store_mut().failing = true;

    // Nothing moves, so nothing is flushed and no error surfaces.
    assert!(!session.deposit(Cell::ORIGIN).unwrap());
    assert!(!session.collect(Cell::new(4, 4)).unwrap());
}

#[test]
fn failed_flush_keeps_the_transfer_in_memory() {
    let store = FlakyStore::default();
    let mut session = GameSession::open(&zero_origin_config(), store, scenario_luck()).unwrap();
    session.store_mut().failing = true;

    let result = session.collect(Cell::ORIGIN);
    assert!(matches!(result, Err(SessionError::Storage { .. })));
    assert_eq!(session.player().coins(), 1);
    assert_eq!(session.world().memento(Cell::ORIGIN).unwrap().num_coins, 29);

    // The next successful flush persists it.
    session.store_mut().failing = false;
    session.save().unwrap();
    assert_eq!(stored_payload(session.store())["playerCoins"], 1);
}

#[test]
fn wandering_and_trading_conserves_coins() {
    let mut session = GameSession::open(&GameConfig::default(), MemoryStore::new(), Arc4Luck).unwrap();
    let mut rng = StdRng::seed_from_u64(0x0060_c01e);

    for _ in 0..300 {
        match rng.random_range(0..3) {
            0 => {
                let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
                session.move_player(direction).unwrap();
                session.sweep().unwrap();
            }
            1 => {
                let cells: Vec<Cell> = session.world().caches().map(|c| c.cell).collect();
                if let Some(&cell) = cells.get(rng.random_range(0..cells.len().max(1))) {
                    session.collect(cell).unwrap();
                }
            }
            _ => {
                let cells: Vec<Cell> = session.world().caches().map(|c| c.cell).collect();
                if let Some(&cell) = cells.get(rng.random_range(0..cells.len().max(1))) {
                    session.deposit(cell).unwrap();
                }
            }
        }
        assert!(session.verify_conservation().is_balanced());
    }
}

#[test]
fn file_store_game_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let config = GameConfig::default();

    let mut session =
        GameSession::open(&config, FileStore::open(dir.path()).unwrap(), Arc4Luck).unwrap();
    // Under the default luck the classroom cell holds floor(0.3386... * 50) coins.
    assert_eq!(session.cache(Cell::ORIGIN).unwrap().coin_count, 16);
    assert!(session.collect(Cell::ORIGIN).unwrap());
    drop(session);

    let resumed =
        GameSession::open(&config, FileStore::open(dir.path()).unwrap(), Arc4Luck).unwrap();
    assert_eq!(resumed.player().coins(), 1);
    assert_eq!(resumed.cache(Cell::ORIGIN).unwrap().coin_count, 15);
    assert!(resumed.verify_conservation().is_balanced());
}

#[test]
fn path_history_is_identical_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = GameConfig::default();
    assert_eq!(config.start_position(), DEFAULT_ORIGIN);

    let mut session =
        GameSession::open(&config, FileStore::open(dir.path()).unwrap(), Arc4Luck).unwrap();
    let mut rng = StdRng::seed_from_u64(0x0070_a7e5);
    for _ in 0..300 {
        let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        session.move_player(direction).unwrap();
    }
    let path = session.player().path().to_vec();
    let position = session.player().position();
    let cell = session.player_cell();
    drop(session);

    let resumed =
        GameSession::open(&config, FileStore::open(dir.path()).unwrap(), Arc4Luck).unwrap();
    assert_eq!(resumed.player().path(), path.as_slice());
    assert_eq!(resumed.player().position(), position);
    assert_eq!(resumed.player_cell(), cell);
}
