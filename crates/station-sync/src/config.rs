//! Sync engine configuration.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use station_types::{HumidityUnit, PressureUnit, TemperatureUnit, UnitPreference};

use crate::traits::LocalConfig;

/// Minimum retention window in hours.
pub const MIN_RETENTION_HOURS: u32 = 1;
/// Maximum retention window in hours (one year).
pub const MAX_RETENTION_HOURS: u32 = 8760;
/// Maximum number of concurrent record sync tasks.
pub const MAX_CONCURRENT_RECORD_SYNCS: usize = 16;

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record sync settings.
    pub sync: SyncConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Local unit preferences, overwritten by cloud settings.
    pub units: UnitPreferences,
}

impl Config {
    /// Load `sync.toml` from the platform config directory, falling back to
    /// defaults when it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write configuration as TOML, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        std::fs::write(path, text).map_err(write_err)
    }

    /// Validate the configuration and return any errors.
    ///
    /// ```
    /// use station_sync::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors: Vec<_> = self
            .sync
            .validate()
            .into_iter()
            .chain(self.storage.validate())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// [`Config::load`] followed by [`Config::validate`].
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load(path).and_then(|config| config.validate().map(|()| config))
    }
}

/// Record sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How far back to fetch history for a sensor that was never synced.
    pub retention_hours: u32,
    /// How many sensors may sync records at the same time.
    pub max_concurrent_record_syncs: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retention_hours: 240,
            max_concurrent_record_syncs: crate::scheduler::DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl SyncConfig {
    /// The retention window as a duration.
    pub fn retention(&self) -> time::Duration {
        time::Duration::hours(i64::from(self.retention_hours))
    }

    /// Validate sync configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(MIN_RETENTION_HOURS..=MAX_RETENTION_HOURS).contains(&self.retention_hours) {
            errors.push(ValidationError::new(
                "sync.retention_hours",
                format!(
                    "retention {} is out of range ({}-{} hours)",
                    self.retention_hours, MIN_RETENTION_HOURS, MAX_RETENTION_HOURS
                ),
            ));
        }

        let workers = self.max_concurrent_record_syncs;
        if workers == 0 {
            errors.push(ValidationError::new(
                "sync.max_concurrent_record_syncs",
                "at least one record sync must be allowed",
            ));
        } else if workers > MAX_CONCURRENT_RECORD_SYNCS {
            errors.push(ValidationError::new(
                "sync.max_concurrent_record_syncs",
                format!(
                    "{} concurrent record syncs is too many (maximum {})",
                    workers, MAX_CONCURRENT_RECORD_SYNCS
                ),
            ));
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Directory for cached background images.
    pub image_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: station_store::default_db_path(),
            image_dir: default_image_dir(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.path",
                "database path cannot be empty",
            ));
        }

        if self.image_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.image_dir",
                "image directory cannot be empty",
            ));
        }

        errors
    }
}

/// Display units used on this device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitPreferences {
    /// Temperature unit.
    pub temperature: TemperatureUnit,
    /// Humidity unit.
    pub humidity: HumidityUnit,
    /// Pressure unit.
    pub pressure: PressureUnit,
}

impl UnitPreferences {
    /// Overwrite one preference.
    pub fn apply(&mut self, unit: UnitPreference) {
        match unit {
            UnitPreference::Temperature(u) => self.temperature = u,
            UnitPreference::Humidity(u) => self.humidity = u,
            UnitPreference::Pressure(u) => self.pressure = u,
        }
    }
}

/// Unit preferences shared between the engine and the rest of the app.
#[derive(Debug, Default)]
pub struct SharedUnits {
    units: RwLock<UnitPreferences>,
}

impl SharedUnits {
    /// Wrap initial preferences.
    pub fn new(units: UnitPreferences) -> Self {
        Self {
            units: RwLock::new(units),
        }
    }

    /// Current preferences.
    pub fn get(&self) -> UnitPreferences {
        *self.units.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalConfig for SharedUnits {
    fn set_unit(&self, unit: UnitPreference) {
        self.units
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .apply(unit);
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `sync.retention_hours`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("station")
        .join("sync.toml")
}

/// Default directory for cached background images.
pub fn default_image_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("station")
        .join("images")
}
