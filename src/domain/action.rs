//! Action events: one record per tick describing what the executor did.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::advisor::Recommendation;
use super::error::TraderError;

/// Decimal places for EUR amounts when logged or displayed.
pub const EUR_DP: u32 = 2;
/// Decimal places for BTC quantities when logged or displayed.
pub const BTC_DP: u32 = 6;

pub const IDLE_COMMENT: &str = "No action - more observations needed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
    None,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::None => "NONE",
        };
        f.write_str(s)
    }
}

impl FromStr for Action {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "NONE" => Ok(Action::None),
            other => Err(TraderError::InputData {
                reason: format!("unknown executor action '{other}'"),
            }),
        }
    }
}

/// Record of a single tick. Values are kept at full precision; rounding
/// happens only through [`ActionEvent::rounded`] at the point of output.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub timestamp: NaiveDateTime,
    pub action: Action,
    pub suggestion: Recommendation,
    pub comment: String,
    pub price: Decimal,
    pub fee: Decimal,
    pub btc_amount: Decimal,
    pub capital_after: Decimal,
    pub net_profit: Decimal,
}

impl ActionEvent {
    /// A `NONE` event for a tick where the executor did not transact.
    pub fn idle(
        timestamp: NaiveDateTime,
        suggestion: Recommendation,
        price: Decimal,
        position: Decimal,
        capital: Decimal,
        estimated_profit: Decimal,
    ) -> Self {
        ActionEvent {
            timestamp,
            action: Action::None,
            suggestion,
            comment: IDLE_COMMENT.to_string(),
            price,
            fee: Decimal::ZERO,
            btc_amount: position,
            capital_after: capital,
            net_profit: estimated_profit,
        }
    }

    /// Copy with EUR fields at 2 dp and the BTC amount at 6 dp.
    pub fn rounded(&self) -> Self {
        ActionEvent {
            price: self.price.round_dp(EUR_DP),
            fee: self.fee.round_dp(EUR_DP),
            btc_amount: self.btc_amount.round_dp(BTC_DP),
            capital_after: self.capital_after.round_dp(EUR_DP),
            net_profit: self.net_profit.round_dp(EUR_DP),
            comment: self.comment.clone(),
            ..*self
        }
    }
}

impl fmt::Display for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rounded();
        write!(
            f,
            "{} @ {} EUR | fee {} | btc {} | capital {} | profit {} | advisor: {}",
            r.action, r.price, r.fee, r.btc_amount, r.capital_after, r.net_profit, r.suggestion
        )
    }
}
