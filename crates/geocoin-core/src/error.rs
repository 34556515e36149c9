//! Error types for the game session.

/// Errors surfaced by [`GameSession`](crate::GameSession).
///
/// Gameplay rejections (an empty cache, a zero balance) are reported as
/// `false`, never as errors. A [`SessionError::Storage`] returned after a
/// transfer means the in-memory state already holds the transfer and only
/// the flush failed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The configuration describes an invalid world.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: geocoin_world::WorldError,
    },

    /// Writing to or clearing the durable store failed.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: geocoin_db::DbError,
    },
}
