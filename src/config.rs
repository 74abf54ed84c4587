//! Monitor configuration.
//!
//! The recognized surface is a single option, `lookback_days`, read from the
//! `hearing_monitor` section of an optional JSON config file. It controls
//! both the fetch window and the store-pruning cutoff.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default trailing time horizon, in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// Configuration for a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Trailing window over which fetched and stored data is considered
    /// relevant.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

const fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// Shape of the config file: settings live under a named section so the file
/// can be shared with the external fetch client.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    hearing_monitor: Option<MonitorConfig>,
}

impl MonitorConfig {
    const MIN_LOOKBACK_DAYS: u32 = 1;

    /// Loads configuration from a JSON file, falling back to defaults when
    /// the file or the `hearing_monitor` section is absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file exists but cannot be read or
    /// parsed, or when the loaded values fail validation. A present-but-bad
    /// config file is an error, not a silent fallback.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default().validate();
        }

        let text = fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&text)?;
        file.hearing_monitor.unwrap_or_default().validate()
    }

    /// Validates configured values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LookbackOutOfRange` when `lookback_days` is
    /// zero; a zero window would prune the entire store every run.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.lookback_days < Self::MIN_LOOKBACK_DAYS {
            return Err(ConfigError::LookbackOutOfRange {
                value: self.lookback_days,
                min: Self::MIN_LOOKBACK_DAYS,
            });
        }
        Ok(self)
    }
}
