//! Configuration access port trait.
//!
//! Typed getters are built on `get_string`. A missing key yields `None` or the
//! default; a present but unparsable value is `ConfigInvalid`.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::error::TraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TraderError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(default);
        };
        let raw = raw.trim();
        raw.parse::<i64>()
            .map_err(|_| invalid(section, key, format!("'{raw}' is not an integer")))
    }

    /// Accepts true/yes/1 and false/no/0, case-insensitively.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TraderError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(default);
        };
        match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(invalid(section, key, format!("'{other}' is not a boolean"))),
        }
    }

    fn get_decimal(&self, section: &str, key: &str) -> Result<Option<Decimal>, TraderError> {
        let Some(raw) = self.get_string(section, key) else {
            return Ok(None);
        };
        let raw = raw.trim();
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{raw}' is not a decimal number")))
    }
}

fn invalid(section: &str, key: &str, reason: String) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
