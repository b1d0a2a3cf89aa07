//! Position executor: capital/position state machine with fee accounting.
//!
//! The executor is either `Flat` (all capital liquid) or `Holding` (all
//! capital deployed into BTC). `buy` and `sell` are the only transitions and
//! each deploys or liquidates everything; there are no partial positions.
//!
//! Fees are a fixed fraction of the gross value on entry and on exit. The
//! amount deployed on entry is kept with the position, so liquidating at the
//! entry price gives back exactly that amount. Arithmetic leaving the decimal
//! range is an `InvariantViolation`.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::info;

use super::action::{Action, ActionEvent};
use super::advisor::Recommendation;
use super::error::TraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    pub initial_capital: Decimal,
    pub fee_rate: Decimal,
    pub min_expected_profit: Decimal,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            initial_capital: Decimal::new(1000, 0),
            fee_rate: Decimal::new(2, 3),
            min_expected_profit: Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Holding {
        quantity: Decimal,
        entry_price: Decimal,
        /// Capital deployed after the entry fee; `quantity * entry_price`.
        invested: Decimal,
    },
}

impl PositionState {
    fn label(&self) -> &'static str {
        match self {
            PositionState::Flat => "flat",
            PositionState::Holding { .. } => "holding",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionExecutor {
    config: ExecutorConfig,
    capital: Decimal,
    state: PositionState,
}

impl PositionExecutor {
    pub fn new(config: ExecutorConfig) -> Result<Self, TraderError> {
        if config.initial_capital <= Decimal::ZERO {
            return Err(TraderError::ConfigInvalid {
                section: "executor".to_string(),
                key: "initial_capital".to_string(),
                reason: "initial_capital must be positive".to_string(),
            });
        }
        if config.fee_rate < Decimal::ZERO || config.fee_rate >= Decimal::ONE {
            return Err(TraderError::ConfigInvalid {
                section: "executor".to_string(),
                key: "fee_rate".to_string(),
                reason: "fee_rate must be in [0, 1)".to_string(),
            });
        }
        Ok(Self {
            capital: config.initial_capital,
            state: PositionState::Flat,
            config,
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn initial_capital(&self) -> Decimal {
        self.config.initial_capital
    }

    pub fn capital(&self) -> Decimal {
        self.capital
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Held BTC quantity; zero while flat.
    pub fn position(&self) -> Decimal {
        match self.state {
            PositionState::Flat => Decimal::ZERO,
            PositionState::Holding { quantity, .. } => quantity,
        }
    }

    /// Entry price of the open position; zero while flat.
    pub fn entry_price(&self) -> Decimal {
        match self.state {
            PositionState::Flat => Decimal::ZERO,
            PositionState::Holding { entry_price, .. } => entry_price,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.state == PositionState::Flat
    }

    /// Exactly one of "liquid and flat" or "deployed and holding" holds.
    pub fn is_consistent(&self) -> bool {
        match self.state {
            PositionState::Flat => self.capital > Decimal::ZERO,
            PositionState::Holding { quantity, .. } => {
                self.capital == Decimal::ZERO && quantity > Decimal::ZERO
            }
        }
    }

    fn fee(&self, amount: Decimal) -> Result<Decimal, TraderError> {
        amount
            .checked_mul(self.config.fee_rate)
            .ok_or_else(|| out_of_range("fee", amount))
    }

    /// Projected profit of liquidating the position at `current_price`.
    ///
    /// Deducts the exit fee and the entry fee recomputed from the entry price,
    /// then subtracts the initial capital. Returns zero while flat.
    // FIXME: the entry fee was already taken out of capital in `buy`, so it is
    // counted twice here and understates the projection by roughly one fee.
    pub fn estimate_net_profit(&self, current_price: Decimal) -> Result<Decimal, TraderError> {
        match self.state {
            PositionState::Flat => Ok(Decimal::ZERO),
            PositionState::Holding {
                entry_price,
                invested,
                ..
            } => {
                let gross = liquidation_value(invested, entry_price, current_price)?;
                let fee_exit = self.fee(gross)?;
                let fee_entry = self.fee(invested)?;
                gross
                    .checked_sub(fee_exit)
                    .and_then(|v| v.checked_sub(fee_entry))
                    .and_then(|v| v.checked_sub(self.config.initial_capital))
                    .ok_or_else(|| out_of_range("projected profit", current_price))
            }
        }
    }

    pub fn buy(
        &mut self,
        price: Decimal,
        timestamp: NaiveDateTime,
        suggestion: Recommendation,
        comment: &str,
    ) -> Result<ActionEvent, TraderError> {
        if !self.is_flat() {
            return Err(TraderError::InvalidStateTransition {
                action: "buy",
                state: self.state.label(),
            });
        }
        if self.capital <= Decimal::ZERO {
            return Err(TraderError::InvalidStateTransition {
                action: "buy",
                state: "without capital",
            });
        }
        check_price(price)?;

        let fee = self.fee(self.capital)?;
        let investable = self.capital - fee;
        if investable <= Decimal::ZERO {
            return Err(TraderError::InvariantViolation {
                reason: format!("investable capital {investable} after fee {fee}"),
            });
        }
        let quantity = investable
            .checked_div(price)
            .ok_or_else(|| out_of_range("bought quantity", price))?;
        if quantity <= Decimal::ZERO {
            return Err(TraderError::InvariantViolation {
                reason: format!("bought quantity {quantity} at price {price}"),
            });
        }

        self.state = PositionState::Holding {
            quantity,
            entry_price: price,
            invested: investable,
        };
        self.capital = Decimal::ZERO;

        info!(
            %price,
            fee = %fee.round_dp(2),
            btc = %quantity.round_dp(6),
            %suggestion,
            comment,
            "executor BUY"
        );

        Ok(ActionEvent {
            timestamp,
            action: Action::Buy,
            suggestion,
            comment: comment.to_string(),
            price,
            fee,
            btc_amount: quantity,
            capital_after: self.capital,
            net_profit: Decimal::ZERO,
        })
    }

    pub fn sell(
        &mut self,
        price: Decimal,
        timestamp: NaiveDateTime,
        suggestion: Recommendation,
        comment: &str,
    ) -> Result<ActionEvent, TraderError> {
        let (quantity, entry_price, invested) = match self.state {
            PositionState::Flat => {
                return Err(TraderError::InvalidStateTransition {
                    action: "sell",
                    state: self.state.label(),
                });
            }
            PositionState::Holding {
                quantity,
                entry_price,
                invested,
            } => (quantity, entry_price, invested),
        };
        check_price(price)?;

        let gross = liquidation_value(invested, entry_price, price)?;
        let fee = self.fee(gross)?;
        let net = gross - fee;
        if net <= Decimal::ZERO {
            return Err(TraderError::InvariantViolation {
                reason: format!("sale proceeds {net} after fee {fee}"),
            });
        }
        let profit = net - self.config.initial_capital;

        self.capital = net;
        self.state = PositionState::Flat;

        info!(
            %price,
            fee = %fee.round_dp(2),
            profit = %profit.round_dp(2),
            %suggestion,
            comment,
            "executor SELL"
        );

        Ok(ActionEvent {
            timestamp,
            action: Action::Sell,
            suggestion,
            comment: comment.to_string(),
            price,
            fee,
            btc_amount: quantity,
            capital_after: self.capital,
            net_profit: profit,
        })
    }

    /// Applies the state machine to one tick.
    ///
    /// Flat: buys on a `buy` recommendation. Holding: sells on a `sell`
    /// recommendation or when the projected profit reaches
    /// `min_expected_profit`. Returns `None` when nothing was done.
    pub fn decide(
        &mut self,
        price: Decimal,
        timestamp: NaiveDateTime,
        suggestion: Recommendation,
        comment: &str,
    ) -> Result<Option<ActionEvent>, TraderError> {
        match self.state {
            PositionState::Flat => {
                if self.capital > Decimal::ZERO && suggestion == Recommendation::Buy {
                    return self.buy(price, timestamp, suggestion, comment).map(Some);
                }
            }
            PositionState::Holding { .. } => {
                let expected = self.estimate_net_profit(price)?;
                if suggestion == Recommendation::Sell
                    || expected >= self.config.min_expected_profit
                {
                    return self.sell(price, timestamp, suggestion, comment).map(Some);
                }
            }
        }
        Ok(None)
    }
}

/// Gross value of a position bought with `invested` at `entry_price`, sold at
/// `price`. Equals `quantity * price`; exact at the entry price.
fn liquidation_value(
    invested: Decimal,
    entry_price: Decimal,
    price: Decimal,
) -> Result<Decimal, TraderError> {
    if price == entry_price {
        return Ok(invested);
    }
    invested
        .checked_mul(price)
        .and_then(|v| v.checked_div(entry_price))
        .ok_or_else(|| out_of_range("position value", price))
}

fn out_of_range(what: &str, input: Decimal) -> TraderError {
    TraderError::InvariantViolation {
        reason: format!("{what} out of decimal range (input {input})"),
    }
}

fn check_price(price: Decimal) -> Result<(), TraderError> {
    if price <= Decimal::ZERO {
        return Err(TraderError::InputData {
            reason: format!("price must be positive, got {price}"),
        });
    }
    Ok(())
}
