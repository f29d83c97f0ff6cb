use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Malformed quiz answers. The user should retake the quiz.
    InvalidInput { detail: String },

    /// Trading window outside the strategy's accepted day range.
    OutOfRange { days: i64, min: u32, max: u32 },

    /// Strategy exists in the selector but is not wired up end-to-end.
    NotSupported { strategy: &'static str },
}

impl ValidationError {
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::InvalidInput {
            detail: detail.into(),
        }
    }

    /// Text shown to the user in place of results.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { .. } => {
                "Your quiz answers could not be read. Please retake the quiz.".to_string()
            }
            Self::OutOfRange { min, max, .. } => {
                format!("Please enter a number of days between {min} and {max}.")
            }
            Self::NotSupported { .. } => {
                "Please select 'Short-term trading (2-30 days)' as the active strategy for now."
                    .to_string()
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { detail } => write!(f, "invalid input: {detail}"),
            Self::OutOfRange { days, min, max } => {
                write!(f, "trading window out of range: {days} not in {min}..={max}")
            }
            Self::NotSupported { strategy } => write!(f, "strategy not supported: {strategy}"),
        }
    }
}

impl std::error::Error for ValidationError {}
