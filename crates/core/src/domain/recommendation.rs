use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub ticker: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub expected_return: f64,
    pub shares: u64,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub items: Vec<ForecastSummary>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Buys at the first forecasted point and sells at the last.
///
/// Returns `None` for an empty series or a non-positive buy price.
pub fn summarize(
    ticker: &str,
    forecast: Vec<ForecastPoint>,
    investment_amount: f64,
) -> Option<ForecastSummary> {
    let first = forecast.first()?;
    let last = forecast.last()?;

    let buy_price = first.predicted;
    let sell_price = last.predicted;
    if !buy_price.is_finite() || buy_price <= 0.0 || !sell_price.is_finite() {
        return None;
    }

    let expected_return = (sell_price - buy_price) / buy_price;
    let shares = (investment_amount / buy_price).floor().max(0.0) as u64;

    Some(ForecastSummary {
        ticker: ticker.to_string(),
        buy_price,
        sell_price,
        buy_date: first.date,
        sell_date: last.date,
        expected_return,
        shares,
        forecast,
    })
}

/// Keeps profitable forecasts, best expected return first, at most `limit`.
///
/// Ties keep their input order.
pub fn rank(forecasts: &[ForecastSummary], limit: usize) -> RecommendationSet {
    let mut eligible: Vec<&ForecastSummary> = forecasts
        .iter()
        .filter(|f| f.sell_price > f.buy_price)
        .collect();

    // Vec::sort_by is stable.
    eligible.sort_by(|a, b| {
        b.expected_return
            .partial_cmp(&a.expected_return)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    RecommendationSet {
        items: eligible.into_iter().take(limit).cloned().collect(),
    }
}
