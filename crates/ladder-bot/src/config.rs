//! Application configuration.

use crate::error::{AppError, AppResult};
use ladder_core::Instrument;
use ladder_executor::ExecutorConfig;
use ladder_mm::LadderConfig;
use ladder_venue::VenueConfig;
use serde::{Deserialize, Serialize};

/// Logging and metrics exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Port for `GET /metrics`; 0 disables the exporter.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub strategy: LadderConfig,

    #[serde(default)]
    pub venue: VenueConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load and validate a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.strategy
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if self.venue.symbol.is_empty() || self.venue.coin.is_empty() {
            return Err(AppError::Config(
                "venue symbol and coin must be set".to_string(),
            ));
        }
        if self.executor.call_timeout_ms == 0 || self.executor.cycle_deadline_ms == 0 {
            return Err(AppError::Config(
                "executor timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The quoted instrument; market type comes from the strategy section.
    pub fn instrument(&self) -> Instrument {
        Instrument::new(
            self.venue.symbol.clone(),
            self.venue.coin.clone(),
            self.strategy.market_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_core::MarketType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.strategy.tier_count(), 5);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.metrics_port, 9090);
        assert_eq!(config.executor.max_attempts, 3);
        assert_eq!(config.instrument().to_string(), "spot:BTC");
    }

    #[test]
    fn test_sections_parse() {
        let config = AppConfig::from_toml_str(
            r#"
[strategy]
market_type = "perp"
order_size_usd = 1000
buy_spreads = [0.002, 0.004]
sell_spreads = [0.002, 0.004]
order_ratios = [0.6, 0.4]

[venue]
symbol = "ETH"
coin = "ETH"

[executor]
cycle_deadline_ms = 5000

[telemetry]
metrics_port = 0
"#,
        )
        .unwrap();

        assert_eq!(config.strategy.order_size_usd, dec!(1000));
        assert_eq!(config.strategy.tier_count(), 2);
        assert_eq!(config.executor.cycle_deadline_ms, 5000);
        assert_eq!(config.telemetry.metrics_port, 0);
        assert_eq!(config.instrument().market_type, MarketType::Perp);
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
[strategy]
order_ratios = [0.5, 0.5, 0.1, 0.1, 0.1]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_unparseable_file_is_config_error() {
        let err = AppConfig::from_toml_str("[strategy\n").unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("parse")));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/ladder.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("read")));
    }
}
