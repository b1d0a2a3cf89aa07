//! CoinGecko live price feed.
//!
//! Polls the simple-price endpoint once per call. Any transport or response
//! problem is reported as a skipped tick; retry policy belongs to the caller.

use chrono::Local;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::domain::config::FeedSettings;
use crate::domain::error::TraderError;
use crate::domain::price::PriceSample;
use crate::ports::price_feed::PriceFeed;

pub struct CoinGeckoFeed {
    client: reqwest::blocking::Client,
    settings: FeedSettings,
}

impl CoinGeckoFeed {
    pub fn new(settings: FeedSettings) -> Result<Self, TraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("trendtrader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TraderError::Feed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, settings })
    }

    fn fetch_price(&self) -> Result<Decimal, TraderError> {
        let response = self
            .client
            .get(&self.settings.url)
            .query(&[
                ("ids", self.settings.coin_id.as_str()),
                ("vs_currencies", self.settings.vs_currency.as_str()),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TraderError::Feed {
                reason: e.to_string(),
            })?;
        let body = response.text().map_err(|e| TraderError::Feed {
            reason: e.to_string(),
        })?;
        parse_price(&body, &self.settings.coin_id, &self.settings.vs_currency)
    }
}

impl PriceFeed for CoinGeckoFeed {
    fn next_sample(&mut self) -> Option<Result<PriceSample, TraderError>> {
        let timestamp = Local::now().naive_local();
        let sample = self
            .fetch_price()
            .and_then(|price| PriceSample::new(timestamp, price));
        if let Ok(s) = &sample {
            debug!(price = %s.close(), "fetched live price");
        }
        Some(sample)
    }
}

/// Extracts `body[coin_id][vs_currency]` as an exact decimal.
pub fn parse_price(body: &str, coin_id: &str, vs_currency: &str) -> Result<Decimal, TraderError> {
    let json: Value = serde_json::from_str(body).map_err(|e| TraderError::InputData {
        reason: format!("response is not JSON: {e}"),
    })?;
    let number = json
        .get(coin_id)
        .and_then(|coin| coin.get(vs_currency))
        .and_then(Value::as_number)
        .ok_or_else(|| TraderError::InputData {
            reason: format!("response has no {coin_id}/{vs_currency} price"),
        })?;

    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| TraderError::InputData {
            reason: format!("invalid price '{text}': {e}"),
        })
}
