//! Domain error types.

/// Top-level error type for trendtrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("insufficient data: have {have} samples, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("invalid state transition: cannot {action} while {state}")]
    InvalidStateTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("invariant violated: {reason}")]
    InvariantViolation { reason: String },

    #[error("invalid price data: {reason}")]
    InputData { reason: String },

    #[error("price feed error: {reason}")]
    Feed { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("log error at {path}: {reason}")]
    Log { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    /// Fatal errors stop the trading loop; the rest skip a tick.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TraderError::InsufficientData { .. }
                | TraderError::InputData { .. }
                | TraderError::Feed { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::Log { .. } => 1,
            TraderError::ConfigParse { .. } | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Feed { .. }
            | TraderError::InputData { .. }
            | TraderError::InsufficientData { .. } => 3,
            TraderError::InvalidStateTransition { .. } | TraderError::InvariantViolation { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
