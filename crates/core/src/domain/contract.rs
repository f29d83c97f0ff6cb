use crate::domain::risk::{self, RiskBucket, RiskSelection, QUIZ, QUIZ_LEN};
use crate::domain::universe;
use crate::domain::window::{self, TradingStrategy};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INVESTMENT_AMOUNT: f64 = 1000.0;
pub const MIN_INVESTMENT_AMOUNT: f64 = 1.0;

/// One submitted quiz answer. Anything that is neither an integer nor a
/// string is kept so it can be rejected as invalid input rather than as a
/// malformed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizAnswer {
    Weight(i64),
    Label(String),
    Other(serde_json::Value),
}

/// Raw quiz answers as submitted, one per question: choice labels, weights, or a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizAnswers(pub Vec<QuizAnswer>);

impl QuizAnswers {
    pub fn from_weights(weights: &[u8]) -> Self {
        Self(
            weights
                .iter()
                .map(|&w| QuizAnswer::Weight(i64::from(w)))
                .collect(),
        )
    }

    /// Maps each answer to its weight against the question it answers.
    pub fn weights(&self) -> Result<Vec<u8>, ValidationError> {
        if self.0.len() != QUIZ_LEN {
            return Err(ValidationError::invalid_input(format!(
                "expected {QUIZ_LEN} answers (got {})",
                self.0.len()
            )));
        }

        QUIZ.iter()
            .zip(&self.0)
            .enumerate()
            .map(|(idx, (question, answer))| {
                let weight = match answer {
                    QuizAnswer::Weight(w) => u8::try_from(*w).ok().filter(|w| (1..=3).contains(w)),
                    QuizAnswer::Label(label) => question.weight_of(label),
                    QuizAnswer::Other(_) => None,
                };
                weight.ok_or_else(|| {
                    ValidationError::invalid_input(format!(
                        "invalid answer {answer:?} for question {}",
                        idx + 1
                    ))
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub risk: RiskSelection,
    #[serde(default)]
    pub quiz_answers: Option<QuizAnswers>,
    #[serde(default = "default_amount")]
    pub investment_amount: f64,
    #[serde(default = "default_strategy")]
    pub strategy: TradingStrategy,
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_amount() -> f64 {
    DEFAULT_INVESTMENT_AMOUNT
}

fn default_strategy() -> TradingStrategy {
    TradingStrategy::ShortTerm
}

fn default_days() -> i64 {
    i64::from(window::DEFAULT_DAYS)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPlan {
    pub bucket: RiskBucket,
    /// Present when the bucket came from the quiz.
    pub quiz_score: Option<u32>,
    pub investment_amount: f64,
    /// Zero when the run is degraded by a warning.
    pub horizon_days: u32,
    pub tickers: Vec<String>,
    pub warning: Option<String>,
}

impl RunPlan {
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

impl RunRequest {
    /// Resolves the risk bucket and checks the window and amount.
    ///
    /// Only malformed quiz answers fail; window and amount problems yield a
    /// plan with a warning and no tickers.
    pub fn validate_and_into_plan(self) -> Result<RunPlan, ValidationError> {
        let (bucket, quiz_score) = match self.risk.bucket() {
            Some(bucket) => (bucket, None),
            None => {
                let answers = self
                    .quiz_answers
                    .as_ref()
                    .ok_or_else(|| ValidationError::invalid_input("quiz answers are required"))?;
                let score = risk::risk_score(&answers.weights()?)?;
                (risk::bucket_for_score(score), Some(score))
            }
        };

        let degraded = |warning: String| RunPlan {
            bucket,
            quiz_score,
            investment_amount: self.investment_amount,
            horizon_days: 0,
            tickers: Vec::new(),
            warning: Some(warning),
        };

        let horizon_days = match window::validate_window(self.strategy, self.days) {
            Ok(days) => days,
            Err(err) => {
                tracing::warn!(error = %err, "trading window rejected");
                return Ok(degraded(err.user_message()));
            }
        };

        if !self.investment_amount.is_finite() || self.investment_amount < MIN_INVESTMENT_AMOUNT {
            tracing::warn!(
                investment_amount = self.investment_amount,
                "investment amount rejected"
            );
            return Ok(degraded(
                "Please enter a valid investment amount.".to_string(),
            ));
        }

        Ok(RunPlan {
            bucket,
            quiz_score,
            investment_amount: self.investment_amount,
            horizon_days,
            tickers: universe::tickers_for(bucket)
                .iter()
                .map(|t| t.to_string())
                .collect(),
            warning: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: serde_json::Value) -> RunRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn applies_defaults() {
        let plan = request(json!({"risk": "high"}))
            .validate_and_into_plan()
            .unwrap();
        assert_eq!(plan.bucket, RiskBucket::High);
        assert_eq!(plan.horizon_days, 20);
        assert_eq!(plan.investment_amount, 1000.0);
        assert_eq!(plan.tickers, vec!["AAPL", "TSLA", "GOOGL", "NVDA", "NFLX"]);
        assert!(plan.warning.is_none());
        assert!(plan.quiz_score.is_none());
    }

    #[test]
    fn quiz_weights_resolve_bucket() {
        let plan = request(json!({
            "risk": "quiz_me",
            "quiz_answers": [1, 1, 2, 2, 2],
        }))
        .validate_and_into_plan()
        .unwrap();
        assert_eq!(plan.bucket, RiskBucket::Low);
        assert_eq!(plan.quiz_score, Some(8));
        assert_eq!(plan.tickers.len(), 6);
    }

    #[test]
    fn quiz_labels_resolve_bucket() {
        let plan = request(json!({
            "risk": "quiz_me",
            "quiz_answers": ["Expert", "5+ years", "View it as an opportunity", "Grow wealth", "Neutral"],
        }))
        .validate_and_into_plan()
        .unwrap();
        assert_eq!(plan.quiz_score, Some(14));
        assert_eq!(plan.bucket, RiskBucket::High);
    }

    #[test]
    fn quiz_without_answers_is_invalid_input() {
        let err = request(json!({"risk": "quiz_me"}))
            .validate_and_into_plan()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInput { .. }));
    }

    #[test]
    fn malformed_quiz_answers_are_invalid_input() {
        let err = request(json!({"risk": "quiz_me", "quiz_answers": [1, 2, 3]}))
            .validate_and_into_plan()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInput { .. }));
    }

    #[test]
    fn maps_labels_per_question() {
        let answers: QuizAnswers = serde_json::from_value(json!([
            "novice",
            " 5+ years ",
            "Stay calm",
            "Grow wealth",
            "Very uncomfortable"
        ]))
        .unwrap();
        assert_eq!(answers.weights().unwrap(), vec![1, 3, 2, 3, 1]);
    }

    #[test]
    fn label_from_another_question_is_rejected() {
        // "Panic" belongs to question 3, not question 1.
        let answers: QuizAnswers = serde_json::from_value(json!([
            "Panic",
            "1-5 years",
            "Stay calm",
            "Grow wealth",
            "Neutral"
        ]))
        .unwrap();
        let err = answers.weights().unwrap_err();
        assert!(err.to_string().contains("question 1"));
    }

    #[test]
    fn mixed_weights_and_labels_are_accepted() {
        let answers: QuizAnswers =
            serde_json::from_value(json!([1, "Intermediate", 1, "Generate income", 3])).unwrap();
        assert_eq!(answers.weights().unwrap(), vec![1, 2, 1, 2, 3]);
    }

    #[test]
    fn out_of_range_and_odd_items_deserialize_then_fail_validation() {
        for raw in [
            json!([1, 1, 1, 1, 300]),
            json!([1, 1, 1, 1, -2]),
            json!([1, 1, 1, 1, 2.5]),
            json!([1, 1, true, 1, 1]),
            json!([1, 1, null, 1, 1]),
            json!([1, 1, {"w": 1}, 1, 1]),
        ] {
            let answers: QuizAnswers = serde_json::from_value(raw.clone()).unwrap();
            assert!(
                matches!(answers.weights(), Err(ValidationError::InvalidInput { .. })),
                "{raw} should be invalid input"
            );
        }
    }

    #[test]
    fn huge_weight_in_request_is_invalid_input() {
        let err = request(json!({"risk": "quiz_me", "quiz_answers": [1, 1, 1, 1, 300]}))
            .validate_and_into_plan()
            .unwrap_err();
        assert!(err.user_message().contains("retake the quiz"));
    }

    #[test]
    fn bad_window_degrades_to_warning() {
        let plan = request(json!({"risk": "medium", "days": 45}))
            .validate_and_into_plan()
            .unwrap();
        assert!(plan.is_degraded());
        assert!(plan.tickers.is_empty());
        assert_eq!(plan.horizon_days, 0);

        let plan = request(json!({"risk": "medium", "strategy": "long_term"}))
            .validate_and_into_plan()
            .unwrap();
        assert!(plan.warning.unwrap().contains("Short-term"));
        assert!(plan.tickers.is_empty());
    }

    #[test]
    fn bad_amount_degrades_to_warning() {
        let plan = request(json!({"risk": "low", "investment_amount": 0.5}))
            .validate_and_into_plan()
            .unwrap();
        assert_eq!(
            plan.warning.as_deref(),
            Some("Please enter a valid investment amount.")
        );
        assert!(plan.tickers.is_empty());
    }
}
