//! Configuration loading and typed config structures for GeoCoin.
//!
//! The canonical configuration lives in `geocoin-config.yaml` at the project
//! root. Every field has a default, so a partial file (or none at all) is a
//! valid configuration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use geocoin_db::SNAPSHOT_KEY;
use geocoin_types::LatLng;
use geocoin_world::{
    DEFAULT_CELLS_PER_DEGREE, DEFAULT_MAX_INITIAL_COINS, DEFAULT_ORIGIN,
    DEFAULT_SPAWN_PROBABILITY, GridMapper, SpawnRules, WorldError,
};
use serde::Deserialize;

/// Environment variable that overrides `storage.dir`.
pub const STORAGE_DIR_ENV: &str = "GEOCOIN_STORAGE_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `geocoin-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Grid anchoring and resolution.
    #[serde(default)]
    pub grid: GridConfig,

    /// Cache spawn parameters.
    #[serde(default)]
    pub spawn: SpawnConfig,

    /// Player movement and start position.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Durable storage location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `GEOCOIN_STORAGE_DIR` overrides `storage.dir` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.storage.apply_env_overrides();
        Ok(config)
    }

    /// Build the grid mapper described by the `grid` section.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the origin or scale is invalid.
    pub fn grid_mapper(&self) -> Result<GridMapper, WorldError> {
        GridMapper::new(self.grid.origin, self.grid.cells_per_degree)
    }

    /// Build the spawn rules described by the `spawn` section.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidSpawnRule`] if the probability is out of
    /// range.
    pub fn spawn_rules(&self) -> Result<SpawnRules, WorldError> {
        SpawnRules::new(self.spawn.probability, self.spawn.max_initial_coins)
    }

    /// Where a new or reset player stands: `player.start`, else the grid
    /// origin.
    pub fn start_position(&self) -> LatLng {
        self.player.start.unwrap_or(self.grid.origin)
    }
}

/// Grid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GridConfig {
    /// South-west corner of cell `(0, 0)`.
    #[serde(default = "default_origin")]
    pub origin: LatLng,

    /// Cells per degree on each axis.
    #[serde(default = "default_cells_per_degree")]
    pub cells_per_degree: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cells_per_degree: default_cells_per_degree(),
        }
    }
}

/// Spawn configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpawnConfig {
    /// Chance in `[0, 1]` that a cell holds a cache.
    #[serde(default = "default_spawn_probability")]
    pub probability: f64,

    /// Exclusive upper bound on a new cache's coin count.
    #[serde(default = "default_max_initial_coins")]
    pub max_initial_coins: u32,

    /// Half-width of the swept window, in cells.
    #[serde(default = "default_neighborhood_size")]
    pub neighborhood_size: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            probability: default_spawn_probability(),
            max_initial_coins: default_max_initial_coins(),
            neighborhood_size: default_neighborhood_size(),
        }
    }
}

/// Player configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// Degrees moved per step.
    #[serde(default = "default_step_degrees")]
    pub step_degrees: f64,

    /// Start position; the grid origin when unset.
    #[serde(default)]
    pub start: Option<LatLng>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            step_degrees: default_step_degrees(),
            start: None,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the file store.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Store key for the snapshot payload.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl StorageConfig {
    /// Override `dir` with `GEOCOIN_STORAGE_DIR` when set.
    pub fn apply_env_overrides(&mut self) {
        self.override_dir(std::env::var_os(STORAGE_DIR_ENV));
    }

    fn override_dir(&mut self, value: Option<OsString>) {
        if let Some(dir) = value.filter(|v| !v.is_empty()) {
            self.dir = PathBuf::from(dir);
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            key: default_storage_key(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_origin() -> LatLng {
    DEFAULT_ORIGIN
}

const fn default_cells_per_degree() -> f64 {
    DEFAULT_CELLS_PER_DEGREE
}

const fn default_spawn_probability() -> f64 {
    DEFAULT_SPAWN_PROBABILITY
}

const fn default_max_initial_coins() -> u32 {
    DEFAULT_MAX_INITIAL_COINS
}

const fn default_neighborhood_size() -> u32 {
    8
}

const fn default_step_degrees() -> f64 {
    1e-4
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".geocoin")
}

fn default_storage_key() -> String {
    SNAPSHOT_KEY.to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_classroom_game() {
        let config = GameConfig::default();
        assert_eq!(config.grid.origin, DEFAULT_ORIGIN);
        assert_eq!(config.grid.cells_per_degree, 10_000.0);
        assert_eq!(config.spawn.probability, 0.1);
        assert_eq!(config.spawn.max_initial_coins, 50);
        assert_eq!(config.spawn.neighborhood_size, 8);
        assert_eq!(config.player.step_degrees, 0.0001);
        assert_eq!(config.storage.key, "gameState");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
grid:
  origin: { lat: 10.0, lng: 20.0 }
  cells_per_degree: 1000
spawn:
  probability: 0.25
  max_initial_coins: 10
  neighborhood_size: 4
player:
  step_degrees: 0.001
  start: { lat: 10.5, lng: 20.5 }
storage:
  dir: "/var/lib/geocoin"
  key: "slot1"
logging:
  level: "debug"
  json: true
"#;
        let config = GameConfig::parse(yaml).unwrap();
        assert_eq!(config.grid.origin, LatLng::new(10.0, 20.0));
        assert_eq!(config.grid.cells_per_degree, 1000.0);
        assert_eq!(config.spawn.probability, 0.25);
        assert_eq!(config.spawn.max_initial_coins, 10);
        assert_eq!(config.spawn.neighborhood_size, 4);
        assert_eq!(config.player.step_degrees, 0.001);
        assert_eq!(config.start_position(), LatLng::new(10.5, 20.5));
        assert_eq!(config.storage.key, "slot1");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_partial_yaml_uses_defaults() {
        let config = GameConfig::parse("spawn:\n  probability: 0.5\n").unwrap();
        assert_eq!(config.spawn.probability, 0.5);
        assert_eq!(config.spawn.max_initial_coins, 50);
        assert_eq!(config.grid, GridConfig::default());
        assert_eq!(config.start_position(), DEFAULT_ORIGIN);
    }

    #[test]
    fn parse_empty_yaml_uses_defaults() {
        let config = GameConfig::parse("{}").unwrap();
        assert_eq!(config.spawn, SpawnConfig::default());
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn invalid_yaml_returns_error() {
        let result = GameConfig::parse("spawn: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let result = GameConfig::from_file(Path::new("/nonexistent/geocoin-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn dir_override_ignores_empty_values() {
        let mut storage = StorageConfig::default();
        storage.override_dir(Some(OsString::new()));
        assert_eq!(storage.dir, PathBuf::from(".geocoin"));
        storage.override_dir(Some(OsString::from("/tmp/geo")));
        assert_eq!(storage.dir, PathBuf::from("/tmp/geo"));
        storage.override_dir(None);
        assert_eq!(storage.dir, PathBuf::from("/tmp/geo"));
    }

    #[test]
    fn invalid_values_surface_when_building_world_parts() {
        let config = GameConfig::parse("grid:\n  cells_per_degree: 0\nspawn:\n  probability: 2.0\n").unwrap();
        assert!(config.grid_mapper().is_err());
        assert!(config.spawn_rules().is_err());
    }
}
