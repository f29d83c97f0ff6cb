use crate::config::{Settings, MAX_HISTORY_DAYS};
use crate::domain::contract::RunPlan;
use crate::domain::recommendation::{self, ForecastSummary, RecommendationSet, TOP_N};
use crate::domain::risk::RiskBucket;
use crate::forecast::Forecaster;
use crate::market::MarketDataSource;
use crate::report::ForecastChart;
use crate::time::us_market;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use uuid::Uuid;

const DEFAULT_TICKER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Trailing calendar days of history used for training.
    pub history_days: i64,

    /// Upper bound on fetch + forecast for a single ticker.
    pub ticker_timeout: Duration,

    pub limit: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            history_days: us_market::DEFAULT_HISTORY_DAYS,
            ticker_timeout: Duration::from_secs(DEFAULT_TICKER_TIMEOUT_SECS),
            limit: TOP_N,
        }
    }
}

impl RunOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut out = Self::default();
        if let Some(days) = settings.history_days {
            out.history_days = days.clamp(2, MAX_HISTORY_DAYS);
        }
        if let Some(secs) = settings.ticker_timeout_secs {
            out.ticker_timeout = Duration::from_secs(secs);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    NoForecast,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub bucket: RiskBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u32>,
    pub horizon_days: u32,
    pub investment_amount: f64,
    pub analyzed: usize,
    pub recommendations: RecommendationSet,
    pub skipped: Vec<SkippedTicker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub charts: Vec<ForecastChart>,
}

enum TickerOutcome {
    Summary(ForecastSummary),
    Skipped(SkipReason, Option<String>),
}

pub async fn run(
    plan: &RunPlan,
    source: Arc<dyn MarketDataSource>,
    forecaster: Arc<dyn Forecaster>,
    opts: &RunOptions,
    now_utc: DateTime<Utc>,
) -> RunReport {
    let run_id = Uuid::new_v4();
    let cutoff = us_market::history_cutoff(now_utc, opts.history_days);

    tracing::info!(
        %run_id,
        bucket = %plan.bucket,
        tickers = plan.tickers.len(),
        horizon_days = plan.horizon_days,
        source = source.source_name(),
        model = forecaster.model_name(),
        "recommendation run started"
    );

    let mut tasks = JoinSet::new();
    for (idx, ticker) in plan.tickers.iter().cloned().enumerate() {
        let source = Arc::clone(&source);
        let forecaster = Arc::clone(&forecaster);
        let horizon = plan.horizon_days;
        let amount = plan.investment_amount;
        let timeout = opts.ticker_timeout;

        tasks.spawn(async move {
            let work = analyze_ticker(&ticker, &*source, &*forecaster, cutoff, horizon, amount);
            let outcome = match tokio::time::timeout(timeout, work).await {
                Ok(outcome) => outcome,
                Err(_) => TickerOutcome::Skipped(SkipReason::TimedOut, None),
            };
            (idx, ticker, outcome)
        });
    }

    let mut outcomes: Vec<(usize, String, TickerOutcome)> = Vec::with_capacity(plan.tickers.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(done) => outcomes.push(done),
            Err(err) => tracing::error!(%run_id, error = %err, "ticker task panicked"),
        }
    }

    // Completion order is arbitrary; ranking ties follow the universe order.
    outcomes.sort_by_key(|(idx, _, _)| *idx);

    let mut summaries = Vec::new();
    let mut skipped = Vec::new();
    for (_, ticker, outcome) in outcomes {
        match outcome {
            TickerOutcome::Summary(s) => summaries.push(s),
            TickerOutcome::Skipped(reason, detail) => {
                tracing::warn!(%run_id, %ticker, ?reason, detail = detail.as_deref(), "ticker skipped");
                skipped.push(SkippedTicker {
                    ticker,
                    reason,
                    detail,
                });
            }
        }
    }

    let recommendations = recommendation::rank(&summaries, opts.limit);
    let charts = recommendations
        .items
        .iter()
        .map(|s| ForecastChart::from_summary(s, plan.horizon_days))
        .collect();

    tracing::info!(
        %run_id,
        analyzed = summaries.len(),
        skipped = skipped.len(),
        recommended = recommendations.len(),
        "recommendation run finished"
    );

    RunReport {
        run_id,
        generated_at: now_utc,
        bucket: plan.bucket,
        quiz_score: plan.quiz_score,
        horizon_days: plan.horizon_days,
        investment_amount: plan.investment_amount,
        analyzed: summaries.len(),
        recommendations,
        skipped,
        warning: plan.warning.clone(),
        charts,
    }
}

async fn analyze_ticker(
    ticker: &str,
    source: &dyn MarketDataSource,
    forecaster: &dyn Forecaster,
    cutoff: chrono::NaiveDate,
    horizon_days: u32,
    investment_amount: f64,
) -> TickerOutcome {
    let history = match source.fetch_history(ticker).await {
        Ok(h) => us_market::trailing_window(h, cutoff),
        Err(err) => return TickerOutcome::Skipped(SkipReason::Failed, Some(format!("{err:#}"))),
    };
    if history.is_empty() {
        return TickerOutcome::Skipped(SkipReason::NoData, None);
    }

    let forecast = match forecaster.forecast(&history, horizon_days).await {
        Ok(f) => f,
        Err(err) => return TickerOutcome::Skipped(SkipReason::Failed, Some(format!("{err:#}"))),
    };

    tracing::debug!(%ticker, training_points = history.len(), forecast_points = forecast.len(), "forecast ready");

    match recommendation::summarize(ticker, forecast, investment_amount) {
        Some(summary) => TickerOutcome::Summary(summary),
        None => TickerOutcome::Skipped(SkipReason::NoForecast, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::RunRequest;
    use crate::domain::recommendation::ForecastPoint;
    use crate::domain::risk::RiskSelection;
    use crate::domain::window::TradingStrategy;
    use crate::forecast::trend::TrendForecaster;
    use crate::market::types::PricePoint;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 18, 0, 0).unwrap()
    }

    /// Linear closes over 120 days ending 2026-03-20, one slope per ticker.
    struct FakeSource {
        slopes: HashMap<&'static str, f64>,
        failing: Vec<&'static str>,
        slow: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl MarketDataSource for FakeSource {
        fn source_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_history(&self, symbol: &str) -> anyhow::Result<Vec<PricePoint>> {
            if self.failing.contains(&symbol) {
                anyhow::bail!("upstream unavailable");
            }
            if self.slow.contains(&symbol) {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
            let Some(slope) = self.slopes.get(symbol) else {
                return Ok(Vec::new());
            };
            let end = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
            // Includes old points that the trailing window must drop.
            Ok((0..120)
                .map(|i| PricePoint {
                    date: end - ChronoDuration::days(119 - i),
                    close: 100.0 + slope * i as f64,
                })
                .collect())
        }
    }

    fn plan(risk: RiskSelection) -> RunPlan {
        RunRequest {
            risk,
            quiz_answers: None,
            investment_amount: 1000.0,
            strategy: TradingStrategy::ShortTerm,
            days: 10,
        }
        .validate_and_into_plan()
        .unwrap()
    }

    fn opts() -> RunOptions {
        RunOptions {
            ticker_timeout: std::time::Duration::from_millis(200),
            ..RunOptions::default()
        }
    }

    fn tickers(report: &RunReport) -> Vec<&str> {
        report
            .recommendations
            .items
            .iter()
            .map(|s| s.ticker.as_str())
            .collect()
    }

    #[tokio::test]
    async fn ranks_rising_tickers_and_skips_the_rest() {
        let source = FakeSource {
            slopes: HashMap::from([
                ("AAPL", 0.5),
                ("TSLA", -0.3),
                ("GOOGL", 1.5),
                ("NVDA", 1.0),
                ("NFLX", 0.2),
            ]),
            failing: vec![],
            slow: vec![],
        };

        let report = run(
            &plan(RiskSelection::High),
            Arc::new(source),
            Arc::new(TrendForecaster::default()),
            &opts(),
            now(),
        )
        .await;

        assert_eq!(tickers(&report), vec!["GOOGL", "NVDA", "AAPL"]);
        assert_eq!(report.analyzed, 5);
        assert_eq!(report.charts.len(), 3);
        assert!(report.skipped.is_empty());
        assert!(report.warning.is_none());

        let top = &report.recommendations.items[0];
        // Trailing 60 days of training points, then 10 forecast days.
        assert_eq!(top.forecast.len(), 60 + 10);
        assert_eq!(top.sell_date, NaiveDate::from_ymd_opt(2026, 3, 30).unwrap());
        assert!(top.expected_return > 0.0);
    }

    #[tokio::test]
    async fn isolates_failing_slow_and_empty_tickers() {
        let source = FakeSource {
            slopes: HashMap::from([("JNJ", 0.1), ("JPM", 0.4), ("V", 0.3), ("PG", 0.2)]),
            failing: vec!["V"],
            slow: vec!["PG"],
        };

        let report = run(
            &plan(RiskSelection::Low),
            Arc::new(source),
            Arc::new(TrendForecaster::default()),
            &opts(),
            now(),
        )
        .await;

        assert_eq!(tickers(&report), vec!["JPM", "JNJ"]);
        let reasons: HashMap<&str, SkipReason> = report
            .skipped
            .iter()
            .map(|s| (s.ticker.as_str(), s.reason))
            .collect();
        assert_eq!(reasons.get("V"), Some(&SkipReason::Failed));
        assert_eq!(reasons.get("PG"), Some(&SkipReason::TimedOut));
        assert_eq!(reasons.get("BRK.B"), Some(&SkipReason::NoData));
        assert_eq!(reasons.get("KO"), Some(&SkipReason::NoData));
    }

    #[tokio::test]
    async fn all_tickers_missing_gives_empty_recommendations() {
        let source = FakeSource {
            slopes: HashMap::new(),
            failing: vec![],
            slow: vec![],
        };

        let report = run(
            &plan(RiskSelection::Medium),
            Arc::new(source),
            Arc::new(TrendForecaster::default()),
            &opts(),
            now(),
        )
        .await;

        assert!(report.recommendations.is_empty());
        assert!(report.charts.is_empty());
        assert_eq!(report.skipped.len(), 5);
    }

    #[tokio::test]
    async fn degraded_plan_analyzes_nothing() {
        let degraded = RunRequest {
            risk: RiskSelection::High,
            quiz_answers: None,
            investment_amount: 1000.0,
            strategy: TradingStrategy::DayTrading,
            days: 10,
        }
        .validate_and_into_plan()
        .unwrap();

        let source = FakeSource {
            slopes: HashMap::from([("AAPL", 1.0)]),
            failing: vec![],
            slow: vec![],
        };
        let report = run(
            &degraded,
            Arc::new(source),
            Arc::new(TrendForecaster::default()),
            &opts(),
            now(),
        )
        .await;

        assert_eq!(report.analyzed, 0);
        assert!(report.recommendations.is_empty());
        assert!(report.warning.is_some());
    }

    struct FlatForecaster;

    #[async_trait::async_trait]
    impl Forecaster for FlatForecaster {
        fn model_name(&self) -> &'static str {
            "flat"
        }

        async fn forecast(
            &self,
            history: &[PricePoint],
            _horizon_days: u32,
        ) -> anyhow::Result<Vec<ForecastPoint>> {
            Ok(history
                .iter()
                .map(|p| ForecastPoint {
                    date: p.date,
                    predicted: 5.0,
                    lower: 4.0,
                    upper: 6.0,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn equal_returns_follow_universe_order() {
        let source = FakeSource {
            slopes: HashMap::from([("AMZN", 1.0), ("FB", 1.0), ("MSFT", 1.0)]),
            failing: vec![],
            slow: vec![],
        };

        let report = run(
            &plan(RiskSelection::Medium),
            Arc::new(source),
            Arc::new(FlatForecaster),
            &opts(),
            now(),
        )
        .await;

        // Flat forecasts are never profitable.
        assert!(report.recommendations.is_empty());
        assert_eq!(report.analyzed, 3);

        let source = FakeSource {
            slopes: HashMap::from([("MSFT", 1.0), ("AMZN", 1.0), ("DIS", 1.0)]),
            failing: vec![],
            slow: vec![],
        };
        let report = run(
            &plan(RiskSelection::Medium),
            Arc::new(source),
            Arc::new(TrendForecaster::default()),
            &opts(),
            now(),
        )
        .await;
        assert_eq!(tickers(&report), vec!["AMZN", "MSFT", "DIS"]);
    }

    #[test]
    fn options_from_settings_clamp_history() {
        let settings = Settings {
            history_days: Some(1_000_000_000_000),
            ticker_timeout_secs: Some(5),
            ..Settings::default()
        };
        let opts = RunOptions::from_settings(&settings);
        assert_eq!(opts.history_days, MAX_HISTORY_DAYS);
        assert_eq!(opts.ticker_timeout, Duration::from_secs(5));

        let opts = RunOptions::from_settings(&Settings::default());
        assert_eq!(opts.history_days, us_market::DEFAULT_HISTORY_DAYS);
        assert_eq!(opts.limit, TOP_N);
    }
}
