//! Concrete adapter implementations for ports.

#[cfg(feature = "live")]
pub mod coingecko_adapter;
pub mod csv_action_log;
pub mod csv_price_feed;
pub mod csv_price_log;
pub mod csv_summary_adapter;
pub mod file_config_adapter;
