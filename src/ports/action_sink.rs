//! Action log port trait.

use chrono::NaiveDate;

use crate::domain::action::ActionEvent;
use crate::domain::error::TraderError;

/// Append-only destination for action events, in tick order.
///
/// Appends are at-least-once: a retried append may store an event twice.
pub trait ActionSink {
    fn append(&mut self, event: &ActionEvent) -> Result<(), TraderError>;

    /// Every event stored for `date`, including those from earlier runs.
    fn day_events(&self, date: NaiveDate) -> Result<Vec<ActionEvent>, TraderError>;
}

impl ActionSink for Vec<ActionEvent> {
    fn append(&mut self, event: &ActionEvent) -> Result<(), TraderError> {
        self.push(event.clone());
        Ok(())
    }

    fn day_events(&self, date: NaiveDate) -> Result<Vec<ActionEvent>, TraderError> {
        Ok(self
            .iter()
            .filter(|e| e.timestamp.date() == date)
            .cloned()
            .collect())
    }
}
