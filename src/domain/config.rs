//! Trader configuration, defaults and validation.
//!
//! Every key is optional; missing keys fall back to the defaults below and
//! present keys are validated before anything runs.

use rust_decimal::Decimal;
use std::path::PathBuf;

use super::advisor::DEFAULT_CONFIRMATIONS;
use super::error::TraderError;
use super::executor::ExecutorConfig;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub poll_interval_secs: u64,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub summary_dir: PathBuf,
    pub record_prices: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            poll_interval_secs: 60,
            data_dir: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            summary_dir: PathBuf::from("summary"),
            record_prices: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    pub url: String,
    pub coin_id: String,
    pub vs_currency: String,
    pub timeout_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            coin_id: "bitcoin".to_string(),
            vs_currency: "eur".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub trend_confirmations: usize,
    pub executor: ExecutorConfig,
    pub simulation: SimulationSettings,
    pub feed: FeedSettings,
}

impl Default for TraderConfig {
    fn default() -> Self {
        TraderConfig {
            trend_confirmations: DEFAULT_CONFIRMATIONS,
            executor: ExecutorConfig::default(),
            simulation: SimulationSettings::default(),
            feed: FeedSettings::default(),
        }
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

pub fn build_trader_config(config: &dyn ConfigPort) -> Result<TraderConfig, TraderError> {
    let defaults = TraderConfig::default();

    let confirmations = config.get_int(
        "advisor",
        "trend_confirmations",
        defaults.trend_confirmations as i64,
    )?;
    if confirmations < 1 {
        return Err(invalid(
            "advisor",
            "trend_confirmations",
            "trend_confirmations must be at least 1",
        ));
    }

    let executor = build_executor_config(config, defaults.executor)?;
    let simulation = build_simulation_settings(config, defaults.simulation)?;
    let feed = build_feed_settings(config, defaults.feed)?;

    Ok(TraderConfig {
        trend_confirmations: confirmations as usize,
        executor,
        simulation,
        feed,
    })
}

fn build_executor_config(
    config: &dyn ConfigPort,
    defaults: ExecutorConfig,
) -> Result<ExecutorConfig, TraderError> {
    let initial_capital = config
        .get_decimal("executor", "initial_capital")?
        .unwrap_or(defaults.initial_capital);
    if initial_capital <= Decimal::ZERO {
        return Err(invalid(
            "executor",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let fee_rate = config
        .get_decimal("executor", "fee_rate")?
        .unwrap_or(defaults.fee_rate);
    if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
        return Err(invalid("executor", "fee_rate", "fee_rate must be in [0, 1)"));
    }

    let min_expected_profit = config
        .get_decimal("executor", "min_expected_profit")?
        .unwrap_or(defaults.min_expected_profit);

    Ok(ExecutorConfig {
        initial_capital,
        fee_rate,
        min_expected_profit,
    })
}

fn build_simulation_settings(
    config: &dyn ConfigPort,
    defaults: SimulationSettings,
) -> Result<SimulationSettings, TraderError> {
    let interval = config.get_int(
        "simulation",
        "poll_interval_secs",
        defaults.poll_interval_secs as i64,
    )?;
    if interval < 1 {
        return Err(invalid(
            "simulation",
            "poll_interval_secs",
            "poll_interval_secs must be at least 1",
        ));
    }

    let dir = |key: &str, default: PathBuf| -> Result<PathBuf, TraderError> {
        match config.get_string("simulation", key) {
            Some(s) if s.trim().is_empty() => {
                Err(invalid("simulation", key, "directory must not be empty"))
            }
            Some(s) => Ok(PathBuf::from(s.trim())),
            None => Ok(default),
        }
    };

    Ok(SimulationSettings {
        poll_interval_secs: interval as u64,
        data_dir: dir("data_dir", defaults.data_dir)?,
        log_dir: dir("log_dir", defaults.log_dir)?,
        summary_dir: dir("summary_dir", defaults.summary_dir)?,
        record_prices: config.get_bool("simulation", "record_prices", defaults.record_prices)?,
    })
}

fn build_feed_settings(
    config: &dyn ConfigPort,
    defaults: FeedSettings,
) -> Result<FeedSettings, TraderError> {
    let timeout = config.get_int("feed", "timeout_secs", defaults.timeout_secs as i64)?;
    if timeout < 1 {
        return Err(invalid("feed", "timeout_secs", "timeout_secs must be at least 1"));
    }

    let text = |key: &str, default: String| -> Result<String, TraderError> {
        match config.get_string("feed", key) {
            Some(s) if s.trim().is_empty() => Err(invalid("feed", key, "value must not be empty")),
            Some(s) => Ok(s.trim().to_string()),
            None => Ok(default),
        }
    };

    Ok(FeedSettings {
        url: text("url", defaults.url)?,
        coin_id: text("coin_id", defaults.coin_id)?,
        vs_currency: text("vs_currency", defaults.vs_currency)?,
        timeout_secs: timeout as u64,
    })
}
