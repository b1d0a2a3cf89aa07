//! Hourly CSV price recorder.
//!
//! Every poll lands in `<dir>/btc_prices_<YYYY-MM-DD_HH>.csv`; polls without a
//! price are written as `NaN` so gaps stay visible.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::action::EUR_DP;
use crate::domain::error::TraderError;
use crate::domain::price::TIMESTAMP_FORMAT;
use crate::ports::price_log::PriceLog;

pub struct CsvPriceLog {
    dir: PathBuf,
}

impl CsvPriceLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn file_for(&self, timestamp: NaiveDateTime) -> PathBuf {
        self.dir
            .join(format!("btc_prices_{}.csv", timestamp.format("%Y-%m-%d_%H")))
    }
}

impl PriceLog for CsvPriceLog {
    fn record(
        &mut self,
        timestamp: NaiveDateTime,
        price: Option<Decimal>,
    ) -> Result<(), TraderError> {
        let path = self.file_for(timestamp);
        let price_field = price
            .map(|p| p.round_dp(EUR_DP).to_string())
            .unwrap_or_else(|| "NaN".to_string());
        let row = [timestamp.format(TIMESTAMP_FORMAT).to_string(), price_field];

        append_row(&path, &["timestamp", "price"], &row)?;
        debug!(path = %path.display(), price = %row[1], "price recorded");
        Ok(())
    }
}

/// Appends one row, creating the file and its header on first use.
pub(crate) fn append_row<S: AsRef<str>>(
    path: &Path,
    header: &[&str],
    row: &[S],
) -> Result<(), TraderError> {
    let log_err = |reason: String| TraderError::Log {
        path: path.display().to_string(),
        reason,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| log_err(e.to_string()))?;
    }
    let is_new = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| log_err(e.to_string()))?;

    let mut writer = csv::Writer::from_writer(file);
    if is_new {
        writer
            .write_record(header)
            .map_err(|e| log_err(e.to_string()))?;
    }
    writer
        .write_record(row.iter().map(|f| f.as_ref()))
        .map_err(|e| log_err(e.to_string()))?;
    writer.flush().map_err(|e| log_err(e.to_string()))?;
    Ok(())
}
