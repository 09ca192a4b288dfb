//! Provider-wide configuration.
//!
//! Settings are read from an optional TOML file (`anyres.toml` by default)
//! and overridden by `ANYRES__SECTION__KEY` environment variables, e.g.
//! `ANYRES__FEATURES__DEFAULT_LOCATION=westeurope`.

pub mod loader;
pub mod settings;

pub use loader::{DEFAULT_CONFIG_PATH, ENV_PREFIX, load_config};
pub use settings::{
    FeaturesConfig, LoggingConfig, ProviderConfig, SchemaConfig, TimeoutsConfig,
    DEFAULT_CREATE_TIMEOUT, DEFAULT_DELETE_TIMEOUT, DEFAULT_READ_TIMEOUT,
};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
