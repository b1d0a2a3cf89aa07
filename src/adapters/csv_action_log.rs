//! Daily CSV action log.
//!
//! One file per day, `<dir>/actions_log_<YYYY-MM-DD>.csv`. Amounts are rounded
//! here, at write time, and nowhere else.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::csv_price_log::append_row;
use crate::domain::action::{Action, ActionEvent};
use crate::domain::advisor::Recommendation;
use crate::domain::error::TraderError;
use crate::domain::price::TIMESTAMP_FORMAT;
use crate::ports::action_sink::ActionSink;

pub const ACTION_LOG_HEADER: [&str; 9] = [
    "timestamp",
    "executor_action",
    "advisor_suggestion",
    "comment",
    "price",
    "fee",
    "btc",
    "capital",
    "net_profit",
];

pub struct CsvActionLog {
    dir: PathBuf,
}

impl CsvActionLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("actions_log_{}.csv", date.format("%Y-%m-%d")))
    }
}

impl ActionSink for CsvActionLog {
    fn append(&mut self, event: &ActionEvent) -> Result<(), TraderError> {
        let r = event.rounded();
        let row = [
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            r.action.to_string(),
            r.suggestion.to_string(),
            r.comment,
            r.price.to_string(),
            r.fee.to_string(),
            r.btc_amount.to_string(),
            r.capital_after.to_string(),
            r.net_profit.to_string(),
        ];
        append_row(&self.file_for(event.timestamp.date()), &ACTION_LOG_HEADER, &row)
    }

    fn day_events(&self, date: NaiveDate) -> Result<Vec<ActionEvent>, TraderError> {
        let path = self.file_for(date);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_events(&path)
    }
}

/// Reads a daily action log back into events (with their logged precision).
pub fn read_events(path: &Path) -> Result<Vec<ActionEvent>, TraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| TraderError::Log {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let mut events = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| TraderError::Log {
            path: path.display().to_string(),
            reason: format!("CSV parse error: {}", e),
        })?;
        let field = |idx: usize| -> Result<&str, TraderError> {
            record.get(idx).ok_or_else(|| TraderError::InputData {
                reason: format!(
                    "row {}: missing {} column",
                    line + 1,
                    ACTION_LOG_HEADER[idx]
                ),
            })
        };
        let decimal = |idx: usize| -> Result<Decimal, TraderError> {
            let raw = field(idx)?;
            Decimal::from_str(raw.trim()).map_err(|e| TraderError::InputData {
                reason: format!(
                    "row {}: invalid {} '{}': {}",
                    line + 1,
                    ACTION_LOG_HEADER[idx],
                    raw,
                    e
                ),
            })
        };

        let timestamp =
            NaiveDateTime::parse_from_str(field(0)?, TIMESTAMP_FORMAT).map_err(|e| {
                TraderError::InputData {
                    reason: format!("row {}: invalid timestamp: {}", line + 1, e),
                }
            })?;

        events.push(ActionEvent {
            timestamp,
            action: Action::from_str(field(1)?)?,
            suggestion: Recommendation::from_str(field(2)?)?,
            comment: field(3)?.to_string(),
            price: decimal(4)?,
            fee: decimal(5)?,
            btc_amount: decimal(6)?,
            capital_after: decimal(7)?,
            net_profit: decimal(8)?,
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn buy_event(timestamp: NaiveDateTime) -> ActionEvent {
        ActionEvent {
            timestamp,
            action: Action::Buy,
            suggestion: Recommendation::Buy,
            comment: "Uptrend confirmed, over 3 samples.".into(),
            price: dec!(94321.987),
            fee: dec!(2),
            btc_amount: dec!(0.01058079102515),
            capital_after: Decimal::ZERO,
            net_profit: Decimal::ZERO,
        }
    }

    #[test]
    fn writes_rounded_rows_under_header() {
        let dir = TempDir::new().unwrap();
        let mut log = CsvActionLog::new(dir.path().to_path_buf());
        log.append(&buy_event(at(30, 10))).unwrap();

        let content = fs::read_to_string(log.file_for(at(30, 10).date())).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,executor_action,advisor_suggestion,comment,price,fee,btc,capital,net_profit"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2025-05-30 10:00:00,BUY,buy,\"Uptrend confirmed, over 3 samples.\",94321.99,2,0.010581,0,0"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn one_file_per_day() {
        let dir = TempDir::new().unwrap();
        let mut log = CsvActionLog::new(dir.path().to_path_buf());
        log.append(&buy_event(at(30, 23))).unwrap();
        log.append(&buy_event(at(31, 0))).unwrap();
        assert!(dir.path().join("actions_log_2025-05-30.csv").exists());
        assert!(dir.path().join("actions_log_2025-05-31.csv").exists());
    }

    #[test]
    fn read_events_returns_logged_values() {
        let dir = TempDir::new().unwrap();
        let mut log = CsvActionLog::new(dir.path().to_path_buf());
        log.append(&buy_event(at(30, 10))).unwrap();
        log.append(&buy_event(at(30, 11))).unwrap();

        let events = read_events(&log.file_for(at(30, 10).date())).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, Action::Buy);
        assert_eq!(events[0].price, dec!(94321.99));
        assert_eq!(events[0].btc_amount, dec!(0.010581));
        assert_eq!(events[0].comment, "Uptrend confirmed, over 3 samples.");
        assert_eq!(events[1].timestamp, at(30, 11));
    }

    #[test]
    fn day_events_reads_back_the_days_file() {
        let dir = TempDir::new().unwrap();
        let mut log = CsvActionLog::new(dir.path().to_path_buf());
        log.append(&buy_event(at(30, 10))).unwrap();
        log.append(&buy_event(at(30, 11))).unwrap();
        log.append(&buy_event(at(31, 9))).unwrap();

        // A fresh handle on the same directory sees what an earlier run wrote.
        let reopened = CsvActionLog::new(dir.path().to_path_buf());
        assert_eq!(reopened.day_events(at(30, 0).date()).unwrap().len(), 2);
        assert_eq!(reopened.day_events(at(31, 0).date()).unwrap().len(), 1);
        assert!(reopened.day_events(at(29, 0).date()).unwrap().is_empty());
    }

    #[test]
    fn read_events_rejects_unknown_action() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            format!(
                "{}\n2025-05-30 10:00:00,HODL,hold,x,1,0,0,1000,0\n",
                ACTION_LOG_HEADER.join(",")
            ),
        )
        .unwrap();
        assert!(matches!(
            read_events(&path),
            Err(TraderError::InputData { .. })
        ));
    }

    #[test]
    fn read_events_missing_file() {
        assert!(matches!(
            read_events(Path::new("/nonexistent/actions.csv")),
            Err(TraderError::Log { .. })
        ));
    }
}
