//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` plus `ladder=debug`.
/// `RUST_ENV=production` switches to JSON output.
pub fn init_logging(level: &str) -> TelemetryResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?,
    };

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn default_directives(level: &str) -> String {
    format!("{level},ladder=debug")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let directives = default_directives("info");
        assert_eq!(directives, "info,ladder=debug");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_second_init_is_an_error() {
        // The global subscriber can only be installed once per process.
        let _ = init_logging("warn");
        let second = init_logging("warn");
        assert!(matches!(second, Err(TelemetryError::LoggingInit(_))));
    }
}
