//! Durable storage for the GeoCoin game core.
//!
//! The store interface is synchronous and string-valued; the game's whole
//! state lives under a single key as a versioned JSON snapshot.
//!
//! # Modules
//!
//! - [`error`] -- [`DbError`] for I/O, serialization and key failures.
//! - [`snapshot_store`] -- [`SnapshotStore`]: the `"gameState"` wire format.
//! - [`store`] -- [`KeyValueStore`] trait with memory and file backends.

pub mod error;
pub mod snapshot_store;
pub mod store;

pub use error::DbError;
pub use snapshot_store::{
    SNAPSHOT_KEY, SNAPSHOT_VERSION, SnapshotStore, decode_snapshot, encode_snapshot,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
