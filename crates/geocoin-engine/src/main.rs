//! Terminal front end for the GeoCoin game.
//!
//! Loads configuration, opens the file-backed store, restores the saved game
//! and runs a line-oriented command loop on stdin. Game output goes to
//! stdout; logs go to stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `geocoin-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Open the file store in `storage.dir`
//! 4. Open the game session (load, restore, sweep)
//! 5. Run the command loop until `quit` or end of input

mod commands;
mod error;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use geocoin_core::{GameConfig, GameSession};
use geocoin_db::FileStore;
use geocoin_world::Arc4Luck;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, Flow};
use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "geocoin-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, storage, or terminal I/O fails.
fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!("geocoin-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Open the durable store.
    let store = FileStore::open(&config.storage.dir)?;
    info!(
        dir = %config.storage.dir.display(),
        key = config.storage.key,
        "File store opened"
    );

    // 4. Open the game session.
    let mut session = GameSession::open(&config, store, Arc4Luck)?;

    // 5. Command loop.
    let stdin = std::io::stdin();
    let mut out = std::io::stdout().lock();
    writeln!(out, "Welcome to GeoCoin. Type `help` for commands.")?;
    prompt(&mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            prompt(&mut out)?;
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => match commands::execute(&mut session, command, &mut out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(EngineError::Io { source }) => return Err(EngineError::Io { source }),
                Err(e) => {
                    error!(error = %e, "Command failed");
                    writeln!(out, "Something went wrong: {e}")?;
                }
            },
            Err(e) => writeln!(out, "{e}")?,
        }
        prompt(&mut out)?;
    }

    info!(
        coins = session.player().coins(),
        steps = session.player().path().len(),
        "geocoin-engine exiting"
    );
    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &Path) -> Result<(GameConfig, bool), EngineError> {
    if path.exists() {
        Ok((GameConfig::from_file(path)?, true))
    } else {
        let mut config = GameConfig::default();
        config.storage.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &GameConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn prompt(out: &mut impl Write) -> Result<(), EngineError> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}
