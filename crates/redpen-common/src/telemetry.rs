//! Tracing setup for redpen binaries.
//!
//! Logs go to stderr so stdout stays clean for command output.
//!
//! ```ignore
//! use redpen_common::telemetry::{self, TelemetryConfig};
//!
//! telemetry::init(TelemetryConfig::from_env("redpen"));
//! tracing::info!("ready");
//! ```

use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name recorded on the startup event.
    pub service_name: String,
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
}

impl TelemetryConfig {
    /// `RUST_LOG`, when set, overrides `console_level`.
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            console_level,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.console_level.as_str().to_lowercase()))
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: TelemetryConfig) {
    INITIALIZED.get_or_init(|| {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_filter(config.filter());

        // A subscriber installed elsewhere (tests, embedding hosts) wins.
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_ok()
        {
            tracing::debug!(service = %config.service_name, "telemetry initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_level() {
        let config = TelemetryConfig::from_env("redpen-test").with_level(Level::WARN);
        assert_eq!(config.console_level, Level::WARN);
        assert_eq!(config.service_name, "redpen-test");
    }

    #[test]
    fn test_init_twice() {
        init(TelemetryConfig::from_env("redpen-test"));
        init(TelemetryConfig::from_env("redpen-test"));
    }
}
