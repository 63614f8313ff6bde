//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DexError, KeyLayout, Result, constants};

/// Configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store key-space layout.
    pub key_layout: KeyLayout,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
    /// Report settlement counters/gauges to the metrics sink.
    pub emit_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_layout: KeyLayout::default(),
            log_filter: constants::DEFAULT_LOG_FILTER.to_string(),
            json_logs: false,
            emit_metrics: true,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DexError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Every row family must have its own prefix.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.key_layout;
        let prefixes = [
            layout.long_book_prefix,
            layout.short_book_prefix,
            layout.price_state_prefix,
            layout.match_result_prefix,
        ];
        for (i, a) in prefixes.iter().enumerate() {
            if prefixes[i + 1..].contains(a) {
                return Err(DexError::Configuration(format!(
                    "key prefix 0x{a:02x} is used by more than one row family"
                )));
            }
        }
        Ok(())
    }
}
