//! Error types for the `geocoin-world` crate.
//!
//! Gameplay never fails: transfers report success as `bool`. [`WorldError`]
//! only covers rejected construction parameters.

/// Errors that can occur when building world components.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The grid scale must be a finite, strictly positive number.
    #[error("invalid grid scale: {cells_per_degree} cells per degree")]
    InvalidGrid {
        /// The rejected scale.
        cells_per_degree: f64,
    },

    /// The grid origin must have finite coordinates.
    #[error("invalid grid origin: ({lat}, {lng})")]
    InvalidOrigin {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lng: f64,
    },

    /// The spawn probability must lie in `[0, 1]`.
    #[error("invalid spawn probability: {probability}")]
    InvalidSpawnRule {
        /// The rejected probability.
        probability: f64,
    },
}
