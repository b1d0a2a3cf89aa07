//! Simple Moving Average indicator.
//!
//! O(n) sliding window sum over close prices.
//! SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n
//! Warmup: first (n-1) samples are invalid.
//! A window sum beyond the decimal range is an `InputData` error.

use rust_decimal::Decimal;

use crate::domain::error::TraderError;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price::PriceSample;

pub fn calculate_sma(
    samples: &[PriceSample],
    period: usize,
) -> Result<IndicatorSeries, TraderError> {
    if period == 0 || samples.is_empty() {
        return Ok(IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: Vec::new(),
        });
    }

    let divisor = Decimal::from(period);
    let mut values = Vec::with_capacity(samples.len());
    let mut window_sum = Decimal::ZERO;

    for (i, sample) in samples.iter().enumerate() {
        window_sum = window_sum
            .checked_add(sample.close())
            .ok_or_else(|| overflow(sample, period))?;
        if i >= period {
            window_sum = window_sum
                .checked_sub(samples[i - period].close())
                .ok_or_else(|| overflow(sample, period))?;
        }

        let valid = i + 1 >= period;
        let sma = if valid {
            window_sum / divisor
        } else {
            Decimal::ZERO
        };

        values.push(IndicatorPoint {
            timestamp: sample.timestamp(),
            valid,
            value: sma,
        });
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    })
}

fn overflow(sample: &PriceSample, period: usize) -> TraderError {
    TraderError::InputData {
        reason: format!(
            "SMA({period}) window sum out of range at price {}",
            sample.close()
        ),
    }
}
