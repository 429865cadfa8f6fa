//! Runtime configuration for the console driver.
//!
//! Read once at startup from the environment. The classifier itself takes no
//! configuration beyond the rule catalog it is built from.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::kernel::telemetry::recorder::DEFAULT_CAPACITY;

pub const ENV_CATALOG: &str = "ATTUNE_CATALOG";
pub const ENV_OUTPUT: &str = "ATTUNE_OUTPUT";
pub const ENV_TELEMETRY_CAPACITY: &str = "ATTUNE_TELEMETRY_CAPACITY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttuneConfig {
    /// Replacement rule catalog. `None` uses the builtin one.
    pub catalog_path: Option<PathBuf>,
    pub output: OutputFormat,
    pub telemetry_capacity: usize,
}

impl Default for AttuneConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            output: OutputFormat::Pretty,
            telemetry_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl AttuneConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = get(ENV_CATALOG) {
            config.catalog_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = get(ENV_OUTPUT) {
            config.output = match raw.to_ascii_lowercase().as_str() {
                "pretty" => OutputFormat::Pretty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_OUTPUT.to_string(),
                        message: format!("expected 'pretty' or 'json', got '{}'", raw),
                    })
                }
            };
        }

        if let Some(raw) = get(ENV_TELEMETRY_CAPACITY) {
            let capacity: usize = raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_TELEMETRY_CAPACITY.to_string(),
                message: format!("'{}' is not a number: {}", raw, e),
            })?;
            if capacity == 0 {
                return Err(ConfigError::InvalidValue {
                    key: ENV_TELEMETRY_CAPACITY.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.telemetry_capacity = capacity;
        }

        Ok(config)
    }
}
