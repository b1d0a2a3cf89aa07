//! CSV summary writer implementing SummaryPort.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::domain::action::EUR_DP;
use crate::domain::error::TraderError;
use crate::domain::price::TIMESTAMP_FORMAT;
use crate::domain::summary::Summary;
use crate::ports::summary_port::SummaryPort;

#[derive(Serialize)]
struct SummaryRow {
    timestamp: String,
    trades_total: usize,
    buys: usize,
    sells: usize,
    total_fee: Decimal,
    total_profit: Decimal,
    final_capital: Decimal,
}

pub struct CsvSummaryAdapter {
    dir: PathBuf,
}

impl CsvSummaryAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl SummaryPort for CsvSummaryAdapter {
    /// Writes `summary_<YYYY-MM-DD_HH>.csv`, replacing a summary from the same hour.
    fn write(&self, summary: &Summary) -> Result<String, TraderError> {
        let path = self.dir.join(format!(
            "summary_{}.csv",
            summary.generated_at.format("%Y-%m-%d_%H")
        ));
        let log_err = |reason: String| TraderError::Log {
            path: path.display().to_string(),
            reason,
        };

        fs::create_dir_all(&self.dir).map_err(|e| log_err(e.to_string()))?;
        let mut writer = csv::Writer::from_path(&path).map_err(|e| log_err(e.to_string()))?;
        writer
            .serialize(SummaryRow {
                timestamp: summary.generated_at.format(TIMESTAMP_FORMAT).to_string(),
                trades_total: summary.trades_total,
                buys: summary.buys,
                sells: summary.sells,
                total_fee: summary.total_fee.round_dp(EUR_DP),
                total_profit: summary.total_profit.round_dp(EUR_DP),
                final_capital: summary.final_capital.round_dp(EUR_DP),
            })
            .map_err(|e| log_err(e.to_string()))?;
        writer.flush().map_err(|e| log_err(e.to_string()))?;

        info!(path = %path.display(), trades = summary.trades_total, "summary written");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_summary() -> Summary {
        Summary {
            generated_at: NaiveDate::from_ymd_opt(2025, 5, 30)
                .unwrap()
                .and_hms_opt(15, 0, 7)
                .unwrap(),
            trades_total: 61,
            buys: 2,
            sells: 1,
            total_fee: dec!(6.1956),
            total_profit: dec!(95.6044),
            final_capital: Decimal::ZERO,
        }
    }

    #[test]
    fn writes_single_row_summary() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvSummaryAdapter::new(dir.path().join("summary"));
        let location = adapter.write(&sample_summary()).unwrap();

        assert!(location.ends_with("summary_2025-05-30_15.csv"));
        let content = fs::read_to_string(&location).unwrap();
        assert_eq!(
            content,
            "timestamp,trades_total,buys,sells,total_fee,total_profit,final_capital\n\
             2025-05-30 15:00:07,61,2,1,6.20,95.60,0\n"
        );
    }

    #[test]
    fn rewrites_same_hour() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvSummaryAdapter::new(dir.path().to_path_buf());
        adapter.write(&sample_summary()).unwrap();
        let mut later = sample_summary();
        later.trades_total = 62;
        let location = adapter.write(&later).unwrap();

        let content = fs::read_to_string(location).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains(",62,"));
    }
}
