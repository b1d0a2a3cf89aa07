//! Periodic trading summaries and their hourly schedule.

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;

use super::action::{Action, ActionEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub generated_at: NaiveDateTime,
    pub trades_total: usize,
    pub buys: usize,
    pub sells: usize,
    pub total_fee: Decimal,
    pub total_profit: Decimal,
    pub final_capital: Decimal,
}

impl Summary {
    /// Aggregates an action log.
    ///
    /// `total_profit` counts realized profit from SELL rows only; NONE rows
    /// carry projections and are ignored for it.
    pub fn from_events(generated_at: NaiveDateTime, events: &[ActionEvent]) -> Self {
        let buys = events.iter().filter(|e| e.action == Action::Buy).count();
        let sells = events.iter().filter(|e| e.action == Action::Sell).count();
        let total_fee = events.iter().map(|e| e.fee).sum();
        let total_profit = events
            .iter()
            .filter(|e| e.action == Action::Sell)
            .map(|e| e.net_profit)
            .sum();
        let final_capital = events
            .last()
            .map(|e| e.capital_after)
            .unwrap_or(Decimal::ZERO);

        Summary {
            generated_at,
            trades_total: events.len(),
            buys,
            sells,
            total_fee,
            total_profit,
            final_capital,
        }
    }
}

/// Fires once per wall-clock hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlySchedule {
    last_hour: Option<NaiveDateTime>,
}

impl HourlySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `now` falls into an hour not yet seen.
    pub fn due(&mut self, now: NaiveDateTime) -> bool {
        let hour = truncate_to_hour(now);
        if self.last_hour == Some(hour) {
            return false;
        }
        self.last_hour = Some(hour);
        true
    }
}

fn truncate_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), 0, 0)
        .unwrap_or(ts)
}
