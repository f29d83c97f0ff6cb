use serde::{Deserialize, Serialize};

/// Offered after recommendations are shown. Carries no behavior beyond the choice itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    TradingPlatform,
    ExpertConsult,
}

impl NextStep {
    pub const ALL: [NextStep; 2] = [NextStep::TradingPlatform, NextStep::ExpertConsult];

    pub fn label(self) -> &'static str {
        match self {
            Self::TradingPlatform => "Take me to a trading platform to invest.",
            Self::ExpertConsult => "Take me to an expert to consult.",
        }
    }
}
