//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; a host process calls
//! [`init_tracing`] once at startup to decide where they go.

use okr_core::{ConfigError, OkrError, OkrResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive when neither `RUST_LOG` nor `OKR_LOG_FILTER` is set.
pub const DEFAULT_LOG_FILTER: &str = "okr_engine=info,okr_storage=info,warn";

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// - `OKR_LOG_FILTER`: filter directive (default: [`DEFAULT_LOG_FILTER`])
    /// - `OKR_LOG_JSON`: `true` or `1` for JSON output (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_filter: std::env::var("OKR_LOG_FILTER").unwrap_or(defaults.log_filter),
            json: std::env::var("OKR_LOG_JSON")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.json),
        }
    }

    /// The filter to install: `RUST_LOG` if set, else the configured directive.
    pub fn env_filter(&self) -> OkrResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.log_filter).map_err(|e| {
            OkrError::Config(ConfigError::InvalidValue {
                field: "log_filter".to_string(),
                value: self.log_filter.clone(),
                reason: e.to_string(),
            })
        })
    }
}

/// Install the global tracing subscriber.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> OkrResult<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter()?);

    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    installed.map_err(|e| {
        OkrError::Config(ConfigError::TelemetryInit {
            reason: e.to_string(),
        })
    })?;

    tracing::info!(json = config.json, filter = %config.log_filter, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let config = TelemetryConfig::default();
        assert!(!config.json);
        assert!(EnvFilter::try_new(&config.log_filter).is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TelemetryConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert!(config.json);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig::default();
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        // Another test in this binary may have installed a subscriber first
        assert!(first.is_err() || second.is_err());
        assert!(
            matches!(second, Err(OkrError::Config(ConfigError::TelemetryInit { .. }))),
            "expected TelemetryInit, got {second:?}"
        );
    }
}
