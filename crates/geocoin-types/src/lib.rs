//! Shared type definitions for the GeoCoin game core.
//!
//! This crate is the single source of truth for the values exchanged between
//! the core and the map view. View-facing types flow downstream to
//! `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`cell`] -- Integer grid addresses and their fixed string key forms
//! - [`geo`] -- Latitude/longitude positions and movement directions
//! - [`structs`] -- Caches, mementos, player state and snapshots

pub mod cell;
pub mod geo;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use cell::Cell;
pub use geo::{Direction, LatLng};
pub use structs::{Cache, CacheMemento, CellBounds, GameSnapshot, PlayerState};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the view layer.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::cell::Cell::export_all();
        let _ = crate::geo::LatLng::export_all();
        let _ = crate::geo::Direction::export_all();
        let _ = crate::structs::Cache::export_all();
        let _ = crate::structs::CacheMemento::export_all();
        let _ = crate::structs::PlayerState::export_all();
        let _ = crate::structs::CellBounds::export_all();
    }
}
