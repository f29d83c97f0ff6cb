use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const QUIZ_LEN: usize = 5;

// Inclusive upper score bounds for the Low and Medium buckets.
const LOW_MAX_SCORE: u32 = 8;
const MEDIUM_MAX_SCORE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub const ALL: [RiskBucket; 3] = [RiskBucket::High, RiskBucket::Medium, RiskBucket::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the risk-level selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSelection {
    High,
    Medium,
    Low,
    QuizMe,
}

impl RiskSelection {
    pub fn bucket(self) -> Option<RiskBucket> {
        match self {
            Self::High => Some(RiskBucket::High),
            Self::Medium => Some(RiskBucket::Medium),
            Self::Low => Some(RiskBucket::Low),
            Self::QuizMe => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuizQuestion {
    pub prompt: &'static str,
    /// Ordered least to most risk tolerant; position i weighs i + 1.
    pub choices: [&'static str; 3],
}

impl QuizQuestion {
    pub fn weight_of(&self, label: &str) -> Option<u8> {
        let label = label.trim();
        self.choices
            .iter()
            .position(|c| c.eq_ignore_ascii_case(label))
            .map(|i| i as u8 + 1)
    }
}

pub const QUIZ: [QuizQuestion; QUIZ_LEN] = [
    QuizQuestion {
        prompt: "How would you describe your current investment knowledge?",
        choices: ["Novice", "Intermediate", "Expert"],
    },
    QuizQuestion {
        prompt: "What is your investment time horizon?",
        choices: ["Less than 1 year", "1-5 years", "5+ years"],
    },
    QuizQuestion {
        prompt: "How do you react to market fluctuations?",
        choices: ["Panic", "Stay calm", "View it as an opportunity"],
    },
    QuizQuestion {
        prompt: "What is your primary investment goal?",
        choices: ["Preserve capital", "Generate income", "Grow wealth"],
    },
    QuizQuestion {
        prompt: "How comfortable are you with the idea of losing money?",
        choices: ["Very uncomfortable", "Neutral", "Comfortable"],
    },
];

pub fn risk_score(answers: &[u8]) -> Result<u32, ValidationError> {
    if answers.len() != QUIZ_LEN {
        return Err(ValidationError::invalid_input(format!(
            "expected {QUIZ_LEN} answers (got {})",
            answers.len()
        )));
    }
    if let Some(bad) = answers.iter().find(|w| !(1..=3).contains(*w)) {
        return Err(ValidationError::invalid_input(format!(
            "answer weight must be 1, 2 or 3 (got {bad})"
        )));
    }

    Ok(answers.iter().map(|&w| u32::from(w)).sum())
}

pub fn bucket_for_score(score: u32) -> RiskBucket {
    if score <= LOW_MAX_SCORE {
        RiskBucket::Low
    } else if score <= MEDIUM_MAX_SCORE {
        RiskBucket::Medium
    } else {
        RiskBucket::High
    }
}

pub fn classify(answers: &[u8]) -> Result<RiskBucket, ValidationError> {
    risk_score(answers).map(bucket_for_score)
}
