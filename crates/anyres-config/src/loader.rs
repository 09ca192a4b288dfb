use std::path::{Path, PathBuf};

use config::{Config, Environment, File};

use crate::{ProviderConfig, Result};

pub const DEFAULT_CONFIG_PATH: &str = "anyres.toml";
pub const ENV_PREFIX: &str = "ANYRES";

/// Loads the provider configuration from `path` (or `anyres.toml` when
/// `None`), applying environment overrides, then validates it. A missing
/// file is not an error.
pub fn load_config(path: Option<&str>) -> Result<ProviderConfig> {
    let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
    let mut builder = Config::builder();
    if file.exists() {
        tracing::debug!(path = %file.display(), "loading provider configuration file");
        builder = builder.add_source(File::from(file));
    }
    // Environment variable overrides, e.g., ANYRES__FEATURES__DEFAULT_LOCATION=westeurope
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );
    let merged: ProviderConfig = builder.build()?.try_deserialize()?;
    merged.validate()?;
    Ok(merged)
}

pub fn load_config_with_default_path<P: AsRef<Path>>(path: Option<P>) -> Result<ProviderConfig> {
    let p = path
        .as_ref()
        .map(|p| p.as_ref().to_string_lossy().to_string());
    load_config(p.as_deref())
}
