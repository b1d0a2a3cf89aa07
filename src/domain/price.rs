//! Price samples and the append-only price history.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::error::TraderError;

/// Timestamp layout shared by every CSV file the loop writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceSample {
    timestamp: NaiveDateTime,
    close: Decimal,
}

impl PriceSample {
    /// Builds a sample, rejecting non-positive prices.
    pub fn new(timestamp: NaiveDateTime, close: Decimal) -> Result<Self, TraderError> {
        if close <= Decimal::ZERO {
            return Err(TraderError::InputData {
                reason: format!("price must be positive, got {close}"),
            });
        }
        Ok(Self { timestamp, close })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn close(&self) -> Decimal {
        self.close
    }
}

/// Ordered sequence of every sample seen so far. Gaps and duplicate
/// timestamps are kept as-is.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    samples: Vec<PriceSample>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: PriceSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    /// Removes the newest sample, for a tick that turned out unusable.
    pub fn pop(&mut self) -> Option<PriceSample> {
        self.samples.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 30)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap()
    }

    #[test]
    fn new_accepts_positive_price() {
        let sample = PriceSample::new(ts(0), dec!(95123.45)).unwrap();
        assert_eq!(sample.close(), dec!(95123.45));
        assert_eq!(sample.timestamp(), ts(0));
    }

    #[test]
    fn new_rejects_zero_and_negative() {
        assert!(matches!(
            PriceSample::new(ts(0), Decimal::ZERO),
            Err(TraderError::InputData { .. })
        ));
        assert!(matches!(
            PriceSample::new(ts(0), dec!(-1)),
            Err(TraderError::InputData { .. })
        ));
    }

    #[test]
    fn history_keeps_duplicates_in_order() {
        let mut history = PriceHistory::new();
        assert!(history.is_empty());
        history.push(PriceSample::new(ts(0), dec!(100)).unwrap());
        history.push(PriceSample::new(ts(0), dec!(101)).unwrap());
        history.push(PriceSample::new(ts(5), dec!(102)).unwrap());

        assert_eq!(history.len(), 3);
        assert_eq!(history.samples()[1].close(), dec!(101));
        assert_eq!(history.samples()[2].close(), dec!(102));
    }

    #[test]
    fn pop_drops_newest_sample() {
        let mut history = PriceHistory::new();
        history.push(PriceSample::new(ts(0), dec!(100)).unwrap());
        history.push(PriceSample::new(ts(1), dec!(101)).unwrap());

        assert_eq!(history.pop().unwrap().close(), dec!(101));
        assert_eq!(history.len(), 1);
        assert_eq!(history.samples()[0].close(), dec!(100));
    }
}
