//! Trend advisor: MA5 vs MA20 crossover with a confirmation window.
//!
//! The advisor is a pure function of the full price history. A signal fires
//! only when the short average stays strictly on one side of the long average
//! for the last `confirmations` aligned samples; equal averages break the run.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::error::TraderError;
use super::indicator::sma::calculate_sma;
use super::price::PriceSample;

pub const SHORT_WINDOW: usize = 5;
pub const LONG_WINDOW: usize = 20;
pub const DEFAULT_CONFIRMATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::Buy => "buy",
            Recommendation::Sell => "sell",
            Recommendation::Hold => "hold",
        };
        f.write_str(s)
    }
}

impl FromStr for Recommendation {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Recommendation::Buy),
            "sell" => Ok(Recommendation::Sell),
            "hold" => Ok(Recommendation::Hold),
            other => Err(TraderError::InputData {
                reason: format!("unknown recommendation '{other}'"),
            }),
        }
    }
}

/// Which branch of the classifier produced the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceReason {
    InsufficientData { have: usize, need: usize },
    Uptrend { confirmations: usize },
    Downtrend { confirmations: usize },
    NoClearTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advice {
    pub recommendation: Recommendation,
    pub reason: AdviceReason,
}

impl Advice {
    pub fn rationale(&self) -> String {
        match self.reason {
            AdviceReason::InsufficientData { have, need } => format!(
                "Not enough data to assess the trend ({have} of {need} samples)."
            ),
            AdviceReason::Uptrend { confirmations } => format!(
                "Uptrend confirmed over the last {confirmations} samples."
            ),
            AdviceReason::Downtrend { confirmations } => format!(
                "Downtrend confirmed over the last {confirmations} samples."
            ),
            AdviceReason::NoClearTrend => {
                format!("No clear trend in MA{SHORT_WINDOW} vs MA{LONG_WINDOW}.")
            }
        }
    }
}

/// Aligned `(MA5, MA20)` pairs for every sample where both averages are defined.
///
/// Fails with `InsufficientData` when the history is shorter than the long window,
/// and with `InputData` when a window sum leaves the decimal range.
pub fn moving_average_pairs(
    samples: &[PriceSample],
) -> Result<Vec<(Decimal, Decimal)>, TraderError> {
    if samples.len() < LONG_WINDOW {
        return Err(TraderError::InsufficientData {
            have: samples.len(),
            need: LONG_WINDOW,
        });
    }

    let short = calculate_sma(samples, SHORT_WINDOW)?;
    let long = calculate_sma(samples, LONG_WINDOW)?;

    Ok(short
        .values
        .iter()
        .zip(&long.values)
        .filter(|(s, l)| s.valid && l.valid)
        .map(|(s, l)| (s.value, l.value))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendAdvisor {
    confirmations: usize,
}

impl Default for TrendAdvisor {
    fn default() -> Self {
        TrendAdvisor {
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }
}

impl TrendAdvisor {
    pub fn new(confirmations: usize) -> Result<Self, TraderError> {
        if confirmations == 0 {
            return Err(TraderError::ConfigInvalid {
                section: "advisor".to_string(),
                key: "trend_confirmations".to_string(),
                reason: "trend_confirmations must be at least 1".to_string(),
            });
        }
        Ok(Self { confirmations })
    }

    /// Classifies the trend of `history`.
    ///
    /// A short history is a `hold`, not an error. Errors from the moving
    /// averages themselves (values out of range) are returned.
    pub fn advise(&self, history: &[PriceSample]) -> Result<Advice, TraderError> {
        let pairs = match moving_average_pairs(history) {
            Ok(pairs) => pairs,
            Err(TraderError::InsufficientData { have, need }) => {
                return Ok(Advice {
                    recommendation: Recommendation::Hold,
                    reason: AdviceReason::InsufficientData { have, need },
                });
            }
            Err(e) => return Err(e),
        };

        // Not enough defined pairs to fill the window counts as unconfirmed.
        if pairs.len() < self.confirmations {
            return Ok(self.no_clear_trend());
        }
        let recent = &pairs[pairs.len() - self.confirmations..];

        let advice = if recent.iter().all(|(short, long)| short > long) {
            Advice {
                recommendation: Recommendation::Buy,
                reason: AdviceReason::Uptrend {
                    confirmations: self.confirmations,
                },
            }
        } else if recent.iter().all(|(short, long)| short < long) {
            Advice {
                recommendation: Recommendation::Sell,
                reason: AdviceReason::Downtrend {
                    confirmations: self.confirmations,
                },
            }
        } else {
            self.no_clear_trend()
        };
        Ok(advice)
    }

    fn no_clear_trend(&self) -> Advice {
        Advice {
            recommendation: Recommendation::Hold,
            reason: AdviceReason::NoClearTrend,
        }
    }
}
