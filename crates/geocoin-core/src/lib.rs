//! Game session orchestration for GeoCoin.
//!
//! This crate ties the world model, the player and durable storage into one
//! explicit context object, [`GameSession`], and loads the YAML
//! configuration that parameterizes it.
//!
//! # Modules
//!
//! - [`config`] -- `geocoin-config.yaml` loading and typed sections.
//! - [`error`] -- [`SessionError`] for storage and world failures.
//! - [`player`] -- [`PlayerSession`]: balance, position, path history.
//! - [`session`] -- [`GameSession`]: sweep, transfers, moves, save/load/reset.

pub mod config;
pub mod error;
pub mod player;
pub mod session;

pub use config::{ConfigError, GameConfig};
pub use error::SessionError;
pub use player::PlayerSession;
pub use session::GameSession;
