//! Structured logging configuration.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Logging settings chosen on the command line.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name reported in the start-up line.
    pub service_name: String,
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit one JSON object per event.
    pub json_logs: bool,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_json_logs(mut self) -> Self {
        self.json_logs = true;
        self
    }

    /// Filter used when `RUST_LOG` is unset: the chosen level for this
    /// service, with HTTP request spans at the same level.
    fn default_filter(&self) -> String {
        format!(
            "{level},tower_http={level},sqlx=warn",
            level = self.log_level
        )
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()?;
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}
