use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub system: SystemConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    pub risk: RiskConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub paper_trading: PaperTradingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    pub dry_run: bool,
    pub database_path: String,
    pub snapshot_path: String,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

/// Market eligibility and edge thresholds for the signal pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_min_edge")]
    pub min_edge: f64,
    #[serde(default)]
    pub min_volume: f64,
    #[serde(default = "default_min_hours")]
    pub min_hours_to_settlement: f64,
    #[serde(default = "default_horizon_days")]
    pub forecast_horizon_days: i64,
    #[serde(default = "default_min_trade")]
    pub min_trade_usd: f64,
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            min_edge: default_min_edge(),
            min_volume: 0.0,
            min_hours_to_settlement: default_min_hours(),
            forecast_horizon_days: default_horizon_days(),
            min_trade_usd: default_min_trade(),
            kelly_fraction: default_kelly_fraction(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    pub bankroll: f64,
    pub max_position_pct: f64,
    pub max_open_positions: usize,
    #[serde(default = "default_max_losses")]
    pub max_consecutive_losses: u32,
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss_usd: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_path")]
    pub csv_log_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaperTradingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_fill_rate")]
    pub fill_rate: f64,
    #[serde(default = "default_slippage")]
    pub slippage_pct: f64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_path(),
        }
    }
}

impl Default for PaperTradingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fill_rate: default_fill_rate(),
            slippage_pct: default_slippage(),
        }
    }
}

fn default_scan_interval() -> u64 { 300 }
fn default_min_edge() -> f64 { 0.05 }
fn default_min_hours() -> f64 { 2.0 }
fn default_horizon_days() -> i64 { 7 }
fn default_min_trade() -> f64 { 0.50 }
fn default_kelly_fraction() -> f64 { 0.25 }
fn default_max_losses() -> u32 { 3 }
fn default_max_daily_loss() -> f64 { 50.0 }
fn default_csv_path() -> String { "signals.csv".to_string() }
fn default_fill_rate() -> f64 { 0.70 }
fn default_slippage() -> f64 { 0.005 }

/// Upper bound for `forecast_horizon_days`.
pub const MAX_HORIZON_DAYS: i64 = 366;

/// Sizing and eligibility parameters handed to the signal generator each cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub bankroll: f64,
    pub max_position_pct: f64,
    pub min_edge: f64,
    pub kelly_fraction: f64,
    pub max_open_positions: usize,
    pub min_volume: f64,
    pub min_hours_to_settlement: f64,
    pub forecast_horizon_days: i64,
    pub min_trade_usd: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let strategy = StrategyConfig::default();
        Self {
            bankroll: 100.0,
            max_position_pct: 0.05,
            min_edge: strategy.min_edge,
            kelly_fraction: strategy.kelly_fraction,
            max_open_positions: 10,
            min_volume: strategy.min_volume,
            min_hours_to_settlement: strategy.min_hours_to_settlement,
            forecast_horizon_days: strategy.forecast_horizon_days,
            min_trade_usd: strategy.min_trade_usd,
        }
    }
}

impl PipelineConfig {
    /// Check the invariants every sizing computation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bankroll.is_finite() || self.bankroll < 0.0 {
            return Err(ConfigError::NegativeBankroll(self.bankroll));
        }
        if !(self.max_position_pct > 0.0 && self.max_position_pct <= 1.0) {
            return Err(ConfigError::OutOfRange("max_position_pct", self.max_position_pct));
        }
        if !(self.kelly_fraction > 0.0 && self.kelly_fraction <= 1.0) {
            return Err(ConfigError::OutOfRange("kelly_fraction", self.kelly_fraction));
        }
        if !(self.min_edge >= 0.0 && self.min_edge < 1.0) {
            return Err(ConfigError::OutOfRange("min_edge", self.min_edge));
        }
        if !(self.min_trade_usd >= 0.0) {
            return Err(ConfigError::OutOfRange("min_trade_usd", self.min_trade_usd));
        }
        if !(0..=MAX_HORIZON_DAYS).contains(&self.forecast_horizon_days) {
            return Err(ConfigError::OutOfRange(
                "forecast_horizon_days",
                self.forecast_horizon_days as f64,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Bankroll must be non-negative, got {0}")]
    NegativeBankroll(f64),

    #[error("{0} out of range: {1}")]
    OutOfRange(&'static str, f64),
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
    pub dry_run: Option<bool>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.pipeline().validate()?;
        Ok(config)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            bankroll: self.risk.bankroll,
            max_position_pct: self.risk.max_position_pct,
            min_edge: self.strategy.min_edge,
            kelly_fraction: self.strategy.kelly_fraction,
            max_open_positions: self.risk.max_open_positions,
            min_volume: self.strategy.min_volume,
            min_hours_to_settlement: self.strategy.min_hours_to_settlement,
            forecast_horizon_days: self.strategy.forecast_horizon_days,
            min_trade_usd: self.strategy.min_trade_usd,
        }
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            config_path: std::env::var("CONFIG_PATH")
                .unwrap_or_else(|_| "config.toml".to_string()),
            dry_run: std::env::var("DRY_RUN").ok().and_then(|v| v.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [system]
        dry_run = true
        database_path = "signals.db"
        snapshot_path = "snapshot.json"

        [strategy]
        min_edge = 0.08
        min_volume = 500.0

        [risk]
        bankroll = 250.0
        max_position_pct = 0.05
        max_open_positions = 8
    "#;

    #[test]
    fn test_load_applies_defaults() {
        let config = Config::from_toml(SAMPLE).unwrap();

        assert_eq!(config.system.scan_interval_secs, 300);
        assert_eq!(config.strategy.forecast_horizon_days, 7);
        assert!((config.strategy.kelly_fraction - 0.25).abs() < 1e-12);
        assert!((config.strategy.min_trade_usd - 0.50).abs() < 1e-12);
        assert_eq!(config.risk.max_consecutive_losses, 3);
        assert!(!config.paper_trading.enabled);
        assert!((config.paper_trading.fill_rate - 0.70).abs() < 1e-12);
        assert_eq!(config.monitoring.csv_log_path, "signals.csv");

        let pipeline = config.pipeline();
        assert!((pipeline.min_edge - 0.08).abs() < 1e-12);
        assert!((pipeline.bankroll - 250.0).abs() < 1e-12);
        assert_eq!(pipeline.max_open_positions, 8);
    }

    #[test]
    fn test_negative_bankroll_rejected() {
        let bad = SAMPLE.replace("bankroll = 250.0", "bankroll = -1.0");
        assert!(Config::from_toml(&bad).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(PipelineConfig::default().validate().is_ok());

        let config = PipelineConfig { max_position_pct: 0.0, ..PipelineConfig::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange("max_position_pct", 0.0))
        );

        let config = PipelineConfig { kelly_fraction: 1.5, ..PipelineConfig::default() };
        assert!(config.validate().is_err());

        let config = PipelineConfig { bankroll: 0.0, ..PipelineConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_forecast_horizon_bounded() {
        let config = PipelineConfig { forecast_horizon_days: 366, ..PipelineConfig::default() };
        assert!(config.validate().is_ok());

        let config =
            PipelineConfig { forecast_horizon_days: 100_000_000, ..PipelineConfig::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange("forecast_horizon_days", 100_000_000.0))
        );

        let config = PipelineConfig { forecast_horizon_days: -1, ..PipelineConfig::default() };
        assert!(config.validate().is_err());
    }
}
