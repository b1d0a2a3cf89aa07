#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use trendtrader::domain::error::TraderError;
use trendtrader::domain::price::PriceSample;
use trendtrader::ports::price_feed::PriceFeed;

pub use trendtrader::domain::action::{Action, ActionEvent};

/// In-memory feed that replays a scripted sequence of polls.
pub struct MockPriceFeed {
    pub polls: VecDeque<Result<PriceSample, TraderError>>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self {
            polls: VecDeque::new(),
        }
    }

    pub fn from_prices(prices: &[Decimal]) -> Self {
        let mut feed = Self::new();
        for (i, price) in prices.iter().enumerate() {
            feed = feed.with_price(minute(i as i64), *price);
        }
        feed
    }

    pub fn with_price(mut self, timestamp: NaiveDateTime, close: Decimal) -> Self {
        self.polls.push_back(PriceSample::new(timestamp, close));
        self
    }

    pub fn with_gap(mut self, reason: &str) -> Self {
        self.polls.push_back(Err(TraderError::Feed {
            reason: reason.to_string(),
        }));
        self
    }
}

impl PriceFeed for MockPriceFeed {
    fn next_sample(&mut self) -> Option<Result<PriceSample, TraderError>> {
        self.polls.pop_front()
    }
}

/// Collects events in memory.
pub type MemorySink = Vec<ActionEvent>;

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 30)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn minute(offset: i64) -> NaiveDateTime {
    start() + Duration::minutes(offset)
}

pub fn sample(offset: i64, close: Decimal) -> PriceSample {
    PriceSample::new(minute(offset), close).unwrap()
}

/// `count` prices starting at `first`, moving by `step` each minute.
pub fn ramp(first: i64, step: i64, count: usize) -> Vec<Decimal> {
    (0..count as i64)
        .map(|i| Decimal::from(first + step * i))
        .collect()
}

pub fn flat(price: i64, count: usize) -> Vec<Decimal> {
    ramp(price, 0, count)
}

pub fn actions(events: &[ActionEvent]) -> Vec<Action> {
    events.iter().map(|e| e.action).collect()
}

/// Writes `timestamp,price` rows to `path`.
pub fn write_price_csv(path: &std::path::Path, rows: &[(NaiveDateTime, &str)]) {
    let mut content = String::from("timestamp,price\n");
    for (ts, price) in rows {
        content.push_str(&format!("{},{}\n", ts.format("%Y-%m-%d %H:%M:%S"), price));
    }
    std::fs::write(path, content).unwrap();
}
