//! Service configuration.

use std::time::Duration;

use autorooms_guard::SpamConfig;
use autorooms_room::ControllerConfig;
use serde::{Deserialize, Serialize};

use crate::AutoroomsError;

/// Everything the service needs, loadable from one JSON document.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub controller: ControllerConfig,
    pub spam: SpamConfig,
    /// How often idle spam windows are evicted.
    pub sweep_interval_secs: u64,
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            spam: SpamConfig::default(),
            sweep_interval_secs: 300,
            log: LogConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parses a JSON configuration, filling in defaults for missing fields.
    ///
    /// # Errors
    /// [`AutoroomsError::Config`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, AutoroomsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Never zero.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
