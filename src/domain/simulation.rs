//! Per-tick driver core: history, advisor, executor and action logging.
//!
//! A `Simulation` owns all mutable state of one run. Independent runs must
//! each build their own instance.

use tracing::{debug, warn};

use super::action::ActionEvent;
use super::advisor::{Advice, TrendAdvisor};
use super::config::TraderConfig;
use super::error::TraderError;
use super::executor::PositionExecutor;
use super::price::{PriceHistory, PriceSample};
use super::summary::HourlySchedule;
use crate::ports::action_sink::ActionSink;

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No usable sample this tick; nothing changed.
    Skipped { reason: String },
    /// The sample was processed and `event` was appended to the sink.
    Acted {
        event: ActionEvent,
        advice: Advice,
        summary_due: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Simulation {
    advisor: TrendAdvisor,
    executor: PositionExecutor,
    history: PriceHistory,
    schedule: HourlySchedule,
}

impl Simulation {
    pub fn new(advisor: TrendAdvisor, executor: PositionExecutor) -> Self {
        Simulation {
            advisor,
            executor,
            history: PriceHistory::new(),
            schedule: HourlySchedule::new(),
        }
    }

    pub fn from_config(config: &TraderConfig) -> Result<Self, TraderError> {
        let advisor = TrendAdvisor::new(config.trend_confirmations)?;
        let executor = PositionExecutor::new(config.executor.clone())?;
        Ok(Self::new(advisor, executor))
    }

    pub fn executor(&self) -> &PositionExecutor {
        &self.executor
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    /// Advances one tick.
    ///
    /// Non-fatal errors, from the sample or from evaluating it, become
    /// `Skipped` and leave the history as it was. Fatal errors are returned
    /// as-is.
    pub fn tick(
        &mut self,
        sample: Result<PriceSample, TraderError>,
        sink: &mut dyn ActionSink,
    ) -> Result<TickOutcome, TraderError> {
        let sample = match sample {
            Ok(sample) => sample,
            Err(e) => return skip(e),
        };

        self.history.push(sample);
        let evaluated = self.evaluate(sample);
        let (event, advice) = match evaluated {
            Ok(evaluated) => evaluated,
            Err(e) => {
                self.history.pop();
                return skip(e);
            }
        };
        sink.append(&event)?;

        let summary_due = self.schedule.due(sample.timestamp());
        Ok(TickOutcome::Acted {
            event,
            advice,
            summary_due,
        })
    }

    fn evaluate(&mut self, sample: PriceSample) -> Result<(ActionEvent, Advice), TraderError> {
        let advice = self.advisor.advise(self.history.samples())?;
        let rationale = advice.rationale();
        debug!(
            price = %sample.close(),
            recommendation = %advice.recommendation,
            rationale = %rationale,
            samples = self.history.len(),
            "advice"
        );

        let event = match self.executor.decide(
            sample.close(),
            sample.timestamp(),
            advice.recommendation,
            &rationale,
        )? {
            Some(event) => event,
            None => ActionEvent::idle(
                sample.timestamp(),
                advice.recommendation,
                sample.close(),
                self.executor.position(),
                self.executor.capital(),
                self.executor.estimate_net_profit(sample.close())?,
            ),
        };
        Ok((event, advice))
    }
}

fn skip(error: TraderError) -> Result<TickOutcome, TraderError> {
    if error.is_fatal() {
        return Err(error);
    }
    warn!(error = %error, "skipping tick");
    Ok(TickOutcome::Skipped {
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::{Action, IDLE_COMMENT};
    use crate::domain::advisor::Recommendation;
    use crate::domain::executor::ExecutorConfig;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 30)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn sample(minute: i64, close: Decimal) -> Result<PriceSample, TraderError> {
        PriceSample::new(start() + Duration::minutes(minute), close)
    }

    fn simulation(min_expected_profit: Decimal) -> Simulation {
        Simulation::new(
            TrendAdvisor::default(),
            PositionExecutor::new(ExecutorConfig {
                min_expected_profit,
                ..ExecutorConfig::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn warmup_ticks_log_none() {
        let mut sim = simulation(dec!(1));
        let mut sink: Vec<ActionEvent> = Vec::new();

        for i in 0..19 {
            let outcome = sim.tick(sample(i, dec!(100)), &mut sink).unwrap();
            assert!(matches!(outcome, TickOutcome::Acted { .. }));
        }
        assert_eq!(sink.len(), 19);
        assert!(sink.iter().all(|e| e.action == Action::None));
        assert!(sink.iter().all(|e| e.comment == IDLE_COMMENT));
        assert_eq!(sink[0].capital_after, dec!(1000));
        assert_eq!(sim.history().len(), 19);
    }

    #[test]
    fn skipped_tick_changes_nothing() {
        let mut sim = simulation(dec!(1));
        let mut sink: Vec<ActionEvent> = Vec::new();
        let outcome = sim
            .tick(
                Err(TraderError::InputData {
                    reason: "NaN".into(),
                }),
                &mut sink,
            )
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Skipped { .. }));
        assert!(sink.is_empty());
        assert!(sim.history().is_empty());
    }

    #[test]
    fn fatal_sample_error_is_returned() {
        let mut sim = simulation(dec!(1));
        let mut sink: Vec<ActionEvent> = Vec::new();
        let result = sim.tick(
            Err(TraderError::InvariantViolation {
                reason: "broken".into(),
            }),
            &mut sink,
        );
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_sample_is_skipped_and_dropped_from_history() {
        let mut sim = simulation(dec!(1));
        let mut sink: Vec<ActionEvent> = Vec::new();
        for i in 0..19 {
            sim.tick(sample(i, dec!(100)), &mut sink).unwrap();
        }

        let outcome = sim.tick(sample(19, Decimal::MAX), &mut sink).unwrap();
        assert!(matches!(outcome, TickOutcome::Skipped { .. }));
        assert_eq!(sim.history().len(), 19);
        assert_eq!(sink.len(), 19);

        let outcome = sim.tick(sample(20, dec!(100)), &mut sink).unwrap();
        assert!(matches!(outcome, TickOutcome::Acted { .. }));
        assert_eq!(sim.history().len(), 20);
        assert_eq!(sink.last().unwrap().price, dec!(100));
    }

    #[test]
    fn rising_market_buys_then_takes_profit() {
        let mut sim = simulation(dec!(1));
        let mut sink: Vec<ActionEvent> = Vec::new();

        for i in 0..30 {
            let price = Decimal::from(100 + i);
            sim.tick(sample(i, price), &mut sink).unwrap();
        }

        let actions: Vec<Action> = sink.iter().map(|e| e.action).collect();
        let first_buy = actions.iter().position(|a| *a == Action::Buy).unwrap();
        // Index 21 is the first tick with three confirmed pairs.
        assert_eq!(first_buy, 21);
        assert_eq!(sink[first_buy].suggestion, Recommendation::Buy);
        assert!(actions.contains(&Action::Sell));
        assert_eq!(sink.len(), 30);
    }

    #[test]
    fn idle_event_while_holding_reports_estimate() {
        let mut sim = simulation(dec!(1000000));
        let mut sink: Vec<ActionEvent> = Vec::new();
        for i in 0..23 {
            sim.tick(sample(i, Decimal::from(100 + i)), &mut sink).unwrap();
        }
        let last = sink.last().unwrap();
        assert_eq!(last.action, Action::None);
        assert_eq!(last.btc_amount, sim.executor().position());
        assert_eq!(last.capital_after, Decimal::ZERO);
        assert_eq!(
            last.net_profit,
            sim.executor().estimate_net_profit(dec!(122)).unwrap()
        );
    }

    #[test]
    fn summary_due_once_per_hour() {
        let mut sim = simulation(dec!(1));
        let mut sink: Vec<ActionEvent> = Vec::new();
        let due: Vec<bool> = [0, 1, 59, 60, 61]
            .iter()
            .map(|&m| match sim.tick(sample(m, dec!(100)), &mut sink).unwrap() {
                TickOutcome::Acted { summary_due, .. } => summary_due,
                TickOutcome::Skipped { .. } => panic!("unexpected skip"),
            })
            .collect();
        assert_eq!(due, vec![true, false, false, true, false]);
    }

    #[test]
    fn from_config_rejects_invalid_values() {
        let mut config = TraderConfig::default();
        config.trend_confirmations = 0;
        assert!(Simulation::from_config(&config).is_err());
    }
}
