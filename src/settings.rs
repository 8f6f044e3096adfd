//! User preferences: which sensors are shown, how, and how often they are read.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempbar_core::SensorKey;

/// How many slots the status line shows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Single,
    Dual,
}

impl Layout {
    pub const fn slot_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Dual => 2,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Dual,
            Self::Dual => Self::Single,
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "1" => Ok(Self::Single),
            "dual" | "2" => Ok(Self::Dual),
            _ => Err(SettingsError::InvalidLayout(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Celsius,
    Fahrenheit,
}

impl Unit {
    /// Converts a reading in degrees Celsius into this unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0:?} is not a four character SMC key")]
    InvalidKey(String),

    #[error("slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("unknown layout {0:?}, expected single or dual")]
    InvalidLayout(String),

    #[error("interval must be between 0 and {} seconds", MAX_INTERVAL_SECS)]
    InvalidInterval,
}

pub const MAX_SLOTS: usize = 2;
/// The longest accepted interval between reads, one day.
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;
const DEFAULT_INTERVAL_SECS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub layout: Layout,
    /// Sensor key per slot. `None` leaves the slot empty.
    pub slots: Vec<Option<String>>,
    pub unit: Unit,
    /// Seconds between reads.
    pub interval_secs: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout: Layout::Single,
            slots: vec![Some("TC0P".to_string()), None],
            unit: Unit::Celsius,
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl Settings {
    /// Where settings live by default.
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tempbar")
            .join("settings.json")
    }

    /// Loads settings from `path`, falling back to defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(write_err)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        check_interval(self.interval_secs)?;
        if self.slots.len() > MAX_SLOTS {
            return Err(SettingsError::InvalidSlot(self.slots.len() - 1));
        }
        for key in self.slots.iter().flatten() {
            parse_key(key)?;
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs).unwrap_or_else(|_| {
            log::warn!("interval {} is out of range, using the default", self.interval_secs);
            Duration::from_secs_f64(DEFAULT_INTERVAL_SECS)
        })
    }

    /// The key assigned to `slot`, if any.
    pub fn slot(&self, slot: usize) -> Option<SensorKey> {
        self.slots
            .get(slot)
            .and_then(Option::as_deref)
            .and_then(SensorKey::parse)
    }

    /// Key assignments for the slots the current layout shows.
    pub fn visible_slots(&self) -> Vec<Option<SensorKey>> {
        (0..self.layout.slot_count()).map(|i| self.slot(i)).collect()
    }
}

/// Accepts intervals in `(0, MAX_INTERVAL_SECS]`.
pub fn check_interval(secs: f64) -> Result<(), SettingsError> {
    if secs > 0.0 && secs <= MAX_INTERVAL_SECS {
        Ok(())
    } else {
        Err(SettingsError::InvalidInterval)
    }
}

pub fn parse_key(key: &str) -> Result<SensorKey, SettingsError> {
    SensorKey::parse(key).ok_or_else(|| SettingsError::InvalidKey(key.to_string()))
}
