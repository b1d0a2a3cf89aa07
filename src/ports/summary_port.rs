//! Summary output port trait.

use crate::domain::error::TraderError;
use crate::domain::summary::Summary;

pub trait SummaryPort {
    /// Persists one summary and returns a human-readable location for it.
    fn write(&self, summary: &Summary) -> Result<String, TraderError>;
}
