//! Structured logging with JSON or pretty output.
//!
//! Logs are written to stderr; stdout carries command output.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Installs one stderr layer, JSON or pretty, behind an `EnvFilter` built
/// from `RUST_LOG` or, failing that, the configured level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .flatten_event(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Standard log event names.
pub mod events {
    /// A route table has been loaded.
    pub const ROUTES_LOADED: &str = "routes_loaded";

    /// A route could not be registered.
    pub const ROUTE_REJECTED: &str = "route_rejected";

    /// The router committed to a matching strategy.
    pub const STRATEGY_SELECTED: &str = "strategy_selected";

    /// A request was matched against the route table.
    pub const LOOKUP_COMPLETED: &str = "lookup_completed";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_routes_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTES_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_rejected {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::ROUTE_REJECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_strategy_selected {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::STRATEGY_SELECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_lookup_completed {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::LOOKUP_COMPLETED,
            $($field)*
        )
    };
}
