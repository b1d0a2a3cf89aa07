//! CSV replay price feed.
//!
//! Reads `timestamp,price` rows from a single file or from every `.csv` file
//! in a directory, in file-name order. The hourly files written by
//! [`CsvPriceLog`](super::csv_price_log::CsvPriceLog) replay in
//! chronological order this way.

use chrono::NaiveDateTime;
use csv::{StringRecord, StringRecordsIntoIter};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::error::TraderError;
use crate::domain::price::{PriceSample, TIMESTAMP_FORMAT};
use crate::ports::price_feed::PriceFeed;

pub struct CsvPriceFeed {
    pending: VecDeque<PathBuf>,
    current: Option<(PathBuf, StringRecordsIntoIter<File>)>,
}

impl CsvPriceFeed {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let pending = if path.is_dir() {
            list_csv_files(path)?
        } else if path.is_file() {
            VecDeque::from([path.to_path_buf()])
        } else {
            return Err(TraderError::Log {
                path: path.display().to_string(),
                reason: "no such file or directory".to_string(),
            });
        };
        Ok(Self {
            pending,
            current: None,
        })
    }

    fn open_next(&mut self) -> Option<Result<(), TraderError>> {
        let path = self.pending.pop_front()?;
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&path);
        match reader {
            Ok(reader) => {
                self.current = Some((path, reader.into_records()));
                Some(Ok(()))
            }
            Err(e) => Some(Err(TraderError::Log {
                path: path.display().to_string(),
                reason: e.to_string(),
            })),
        }
    }
}

impl PriceFeed for CsvPriceFeed {
    fn next_sample(&mut self) -> Option<Result<PriceSample, TraderError>> {
        loop {
            if self.current.is_none() {
                if let Err(e) = self.open_next()? {
                    return Some(Err(e));
                }
            }
            let (path, records) = self.current.as_mut()?;
            match records.next() {
                Some(Ok(record)) => return Some(parse_record(&record)),
                Some(Err(e)) => {
                    return Some(Err(TraderError::InputData {
                        reason: format!("{}: {}", path.display(), e),
                    }));
                }
                None => self.current = None,
            }
        }
    }
}

fn list_csv_files(dir: &Path) -> Result<VecDeque<PathBuf>, TraderError> {
    let entries = fs::read_dir(dir).map_err(|e| TraderError::Log {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files.into())
}

fn parse_record(record: &StringRecord) -> Result<PriceSample, TraderError> {
    let ts_str = record.get(0).ok_or_else(|| TraderError::InputData {
        reason: "missing timestamp column".into(),
    })?;
    let timestamp = NaiveDateTime::parse_from_str(ts_str, TIMESTAMP_FORMAT).map_err(|e| {
        TraderError::InputData {
            reason: format!("invalid timestamp '{}': {}", ts_str, e),
        }
    })?;

    let price_str = record.get(1).unwrap_or("");
    if price_str.is_empty() || price_str.eq_ignore_ascii_case("nan") {
        return Err(TraderError::InputData {
            reason: format!("no price at {}", ts_str),
        });
    }
    let close = Decimal::from_str(price_str).map_err(|e| TraderError::InputData {
        reason: format!("invalid price '{}': {}", price_str, e),
    })?;

    PriceSample::new(timestamp, close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn setup_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("btc_prices_2025-05-30_10.csv"),
            "timestamp,price\n\
             2025-05-30 10:00:00,95000.10\n\
             2025-05-30 10:01:00,NaN\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("btc_prices_2025-05-30_09.csv"),
            "timestamp,price\n\
             2025-05-30 09:58:00,94990.00\n\
             2025-05-30 09:59:00,94995.5\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        dir
    }

    fn drain(feed: &mut CsvPriceFeed) -> Vec<Result<PriceSample, TraderError>> {
        std::iter::from_fn(|| feed.next_sample()).collect()
    }

    #[test]
    fn replays_directory_in_name_order() {
        let dir = setup_dir();
        let mut feed = CsvPriceFeed::open(dir.path()).unwrap();
        let items = drain(&mut feed);

        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_ref().unwrap().close(), dec!(94990.00));
        assert_eq!(items[1].as_ref().unwrap().close(), dec!(94995.5));
        assert_eq!(items[2].as_ref().unwrap().close(), dec!(95000.10));
        assert!(matches!(items[3], Err(TraderError::InputData { .. })));
    }

    #[test]
    fn replays_single_file() {
        let dir = setup_dir();
        let mut feed =
            CsvPriceFeed::open(dir.path().join("btc_prices_2025-05-30_09.csv")).unwrap();
        let first = feed.next_sample().unwrap().unwrap();
        assert_eq!(
            first.timestamp(),
            NaiveDateTime::parse_from_str("2025-05-30 09:58:00", TIMESTAMP_FORMAT).unwrap()
        );
        assert!(feed.next_sample().unwrap().is_ok());
        assert!(feed.next_sample().is_none());
    }

    #[test]
    fn bad_rows_are_input_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(
            &path,
            "timestamp,price\n\
             yesterday,100\n\
             2025-05-30 10:00:00,-5\n\
             2025-05-30 10:01:00,abc\n\
             2025-05-30 10:02:00,\n\
             2025-05-30 10:03:00,100.5\n",
        )
        .unwrap();
        let mut feed = CsvPriceFeed::open(&path).unwrap();
        let items = drain(&mut feed);
        assert_eq!(items.len(), 5);
        for item in &items[..4] {
            assert!(matches!(item, Err(TraderError::InputData { .. })));
        }
        assert_eq!(items[4].as_ref().unwrap().close(), dec!(100.5));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(CsvPriceFeed::open("/nonexistent/prices").is_err());
    }

    #[test]
    fn empty_directory_is_exhausted() {
        let dir = TempDir::new().unwrap();
        let mut feed = CsvPriceFeed::open(dir.path()).unwrap();
        assert!(feed.next_sample().is_none());
    }
}
