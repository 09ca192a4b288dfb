use std::path::PathBuf;
use std::time::Duration;

use anyres_core::{Tags, validate_tags};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const VALID_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProviderConfig {
    /// Subscription that scopes `default_naming` and is reported in logs.
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

/// Provider-level defaults applied to every resource.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeaturesConfig {
    /// Name used when a resource omits `name`.
    #[serde(default)]
    pub default_naming: Option<String>,
    /// Tags applied when a resource omits `tags` and its type can carry them.
    #[serde(default)]
    pub default_tags: Tags,
    /// Location applied when a resource omits `location` and its type can carry one.
    #[serde(default)]
    pub default_location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Source of structural definitions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SchemaConfig {
    /// JSON file with an array of resource definitions.
    #[serde(default)]
    pub definitions_path: Option<PathBuf>,
}

/// Per-operation deadlines, e.g. `create = "45m"`. Update uses `create`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TimeoutsConfig {
    #[serde(default, with = "humantime_serde")]
    pub create: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub read: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub delete: Option<Duration>,
}

impl TimeoutsConfig {
    pub fn create(&self) -> Duration {
        self.create.unwrap_or(DEFAULT_CREATE_TIMEOUT)
    }

    pub fn read(&self) -> Duration {
        self.read.unwrap_or(DEFAULT_READ_TIMEOUT)
    }

    pub fn delete(&self) -> Duration {
        self.delete.unwrap_or(DEFAULT_DELETE_TIMEOUT)
    }
}

impl ProviderConfig {
    /// Creates a configuration for `subscription_id` with every other setting defaulted.
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscription_id.trim().is_empty() {
            return Err(ConfigError::validation("subscription_id must not be empty"));
        }
        if let Some(naming) = &self.features.default_naming
            && naming.trim().is_empty()
        {
            return Err(ConfigError::validation(
                "features.default_naming must not be empty when set",
            ));
        }
        if let Some(location) = &self.features.default_location
            && location.trim().is_empty()
        {
            return Err(ConfigError::validation(
                "features.default_location must not be empty when set",
            ));
        }
        validate_tags(&self.features.default_tags)
            .map_err(|e| ConfigError::validation(format!("features.default_tags: {e}")))?;

        let lvl = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {VALID_LOG_LEVELS:?}"
            )));
        }

        for (name, timeout) in [
            ("create", self.timeouts.create),
            ("read", self.timeouts.read),
            ("delete", self.timeouts.delete),
        ] {
            if timeout.is_some_and(|t| t.is_zero()) {
                return Err(ConfigError::validation(format!("timeouts.{name} must be > 0")));
            }
        }
        Ok(())
    }
}
