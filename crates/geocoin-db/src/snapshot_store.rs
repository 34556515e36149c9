//! Snapshot persistence: the versioned `"gameState"` payload.
//!
//! A [`GameSnapshot`] is written as one JSON document under a single store
//! key:
//!
//! ```text
//! {
//!   "version": 1,
//!   "savedAt": "2026-10-14T09:30:00Z",
//!   "playerCoins": 1,
//!   "cacheStates": [["0:0", "{\"i\":0,\"j\":0,\"numCoins\":29}"]],
//!   "playerPath": [{"lat": 36.98959, "lng": -122.06277}]
//! }
//! ```
//!
//! Each memento travels as its own JSON text inside the pair list, which
//! keeps payloads written before the version tag existed readable. Reading
//! never fails: an absent key, unparseable JSON, or a version newer than
//! [`SNAPSHOT_VERSION`] all yield `None` and a warning.

use chrono::{DateTime, Utc};
use geocoin_types::{CacheMemento, Cell, GameSnapshot, LatLng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::store::KeyValueStore;

/// Default store key holding the snapshot payload.
pub const SNAPSHOT_KEY: &str = "gameState";

/// Newest payload version this build writes and reads.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Wire form of a snapshot. Every field defaults when missing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    player_coins: u32,
    #[serde(default)]
    cache_states: Vec<(String, String)>,
    #[serde(default)]
    player_path: Vec<LatLng>,
}

/// Encode `snapshot` as a current-version payload stamped with `saved_at`.
///
/// # Errors
///
/// Returns [`DbError::Serialization`] if a memento or the payload cannot be
/// serialized.
pub fn encode_snapshot(snapshot: &GameSnapshot, saved_at: DateTime<Utc>) -> Result<String, DbError> {
    let cache_states = snapshot
        .mementos
        .iter()
        .map(|(cell, memento)| -> Result<(String, String), serde_json::Error> {
            Ok((cell.memento_key(), memento.to_json()?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let payload = SnapshotPayload {
        version: Some(SNAPSHOT_VERSION),
        saved_at: Some(saved_at),
        player_coins: snapshot.player_coins,
        cache_states,
        player_path: snapshot.player_path.clone(),
    };
    Ok(serde_json::to_string(&payload)?)
}

/// Decode a payload of any supported version.
///
/// A payload without a version tag is read as version 1. Each memento's
/// own `(i, j)` is authoritative; a pair key that disagrees with it is
/// logged and ignored. Repeated cells keep the last entry.
///
/// # Errors
///
/// Returns [`DbError::Serialization`] if the payload or any memento text is
/// malformed, [`DbError::NotAnObject`] if the top level is not an object,
/// or [`DbError::UnsupportedVersion`] for a newer payload.
pub fn decode_snapshot(text: &str) -> Result<GameSnapshot, DbError> {
    // Fields are read by name only; a positional array is not a payload.
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(DbError::NotAnObject);
    }
    let payload: SnapshotPayload = serde_json::from_value(value)?;

    let version = payload.version.unwrap_or(1);
    if version > SNAPSHOT_VERSION {
        return Err(DbError::UnsupportedVersion {
            found: version,
            supported: SNAPSHOT_VERSION,
        });
    }

    let mut snapshot = GameSnapshot {
        player_coins: payload.player_coins,
        player_path: payload.player_path,
        ..GameSnapshot::default()
    };
    for (key, memento_text) in payload.cache_states {
        let memento = CacheMemento::from_json(&memento_text)?;
        let cell = memento.cell();
        if Cell::parse_memento_key(&key) != Some(cell) {
            warn!(key = %key, %cell, "Memento key disagrees with its cell; using the cell");
        }
        snapshot.mementos.insert(cell, memento);
    }
    Ok(snapshot)
}

/// Reads and writes [`GameSnapshot`]s through a [`KeyValueStore`].
#[derive(Debug)]
pub struct SnapshotStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    /// Wrap `store`, using the default [`SNAPSHOT_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, SNAPSHOT_KEY)
    }

    /// Wrap `store`, keeping the payload under `key`.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The key the payload lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the wrapper and return the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Write `snapshot` under the payload key, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if encoding or the store write fails.
    pub fn save(&mut self, snapshot: &GameSnapshot) -> Result<(), DbError> {
        let text = encode_snapshot(snapshot, Utc::now())?;
        self.store.set(&self.key, &text)?;
        debug!(
            key = %self.key,
            coins = snapshot.player_coins,
            mementos = snapshot.mementos.len(),
            path = snapshot.player_path.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Read the stored snapshot, or `None` if there is nothing usable.
    pub fn load(&self) -> Option<GameSnapshot> {
        let text = match self.store.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(key = %self.key, "No stored snapshot");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not read stored snapshot");
                return None;
            }
        };

        match decode_snapshot(&text) {
            Ok(snapshot) => {
                info!(
                    key = %self.key,
                    coins = snapshot.player_coins,
                    mementos = snapshot.mementos.len(),
                    "Loaded snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable snapshot");
                None
            }
        }
    }

    /// Clear the whole durable store, not just the payload key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be cleared.
    pub fn clear(&mut self) -> Result<(), DbError> {
        self.store.clear()?;
        info!(key = %self.key, "Cleared durable store");
        Ok(())
    }
}
