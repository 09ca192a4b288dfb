//! Process-wide tracing subscriber whose level the provider configuration controls.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

/// Installs the global subscriber on first use; later calls only move the level.
///
/// `RUST_LOG`, when set and parseable, wins over `level` at install time.
pub fn init_tracing_with_level(level: &str) {
    if FILTER_HANDLE.get().is_some() {
        apply_logging_level(level);
        return;
    }

    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .try_init();
    match installed {
        Ok(()) => {
            if FILTER_HANDLE.set(handle).is_err() {
                tracing::debug!("log filter handle already registered by a concurrent init");
            }
        }
        // the host process owns the global subscriber; leave its filter alone
        Err(err) => tracing::debug!(error = %err, "tracing subscriber already installed"),
    }
}

/// Replaces the active filter when this module installed the subscriber.
pub fn apply_logging_level(level: &str) {
    let Some(handle) = FILTER_HANDLE.get() else {
        tracing::debug!(level, "no reloadable log filter installed, level unchanged");
        return;
    };
    if let Err(err) = handle.modify(|filter| *filter = EnvFilter::new(level)) {
        tracing::debug!(error = %err, level, "failed to apply log level");
    }
}
