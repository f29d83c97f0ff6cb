use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAYS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingStrategy {
    DayTrading,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TradingStrategy {
    pub const ALL: [TradingStrategy; 4] = [
        TradingStrategy::DayTrading,
        TradingStrategy::ShortTerm,
        TradingStrategy::MediumTerm,
        TradingStrategy::LongTerm,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::DayTrading => "day_trading",
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DayTrading => "Day trading",
            Self::ShortTerm => "Short-term trading (2-30 days)",
            Self::MediumTerm => "Medium-term investing",
            Self::LongTerm => "Long-term investing",
        }
    }

    /// Accepted day range, or None when the strategy is not active.
    pub fn day_range(self) -> Option<(u32, u32)> {
        match self {
            Self::ShortTerm => Some((2, 30)),
            Self::DayTrading | Self::MediumTerm | Self::LongTerm => None,
        }
    }

    pub fn is_active(self) -> bool {
        self.day_range().is_some()
    }
}

pub fn validate_window(strategy: TradingStrategy, days: i64) -> Result<u32, ValidationError> {
    let (min, max) = strategy.day_range().ok_or(ValidationError::NotSupported {
        strategy: strategy.key(),
    })?;

    if days < i64::from(min) || days > i64::from(max) {
        return Err(ValidationError::OutOfRange { days, min, max });
    }

    Ok(days as u32)
}
