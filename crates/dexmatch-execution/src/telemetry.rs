//! Process-wide `tracing` setup.

use dexmatch_types::{DexError, EngineConfig, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the filter: `RUST_LOG` wins, otherwise the configured directive.
pub fn env_filter(config: &EngineConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .map_err(|e| DexError::Configuration(format!("invalid log filter {:?}: {e}", config.log_filter))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &EngineConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| DexError::Configuration(format!("tracing already initialised: {e}")))
}
