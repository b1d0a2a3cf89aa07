//! Raw price recording port trait.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::error::TraderError;

/// Records every poll of the feed, including polls that returned no price.
pub trait PriceLog {
    fn record(&mut self, timestamp: NaiveDateTime, price: Option<Decimal>)
        -> Result<(), TraderError>;
}
