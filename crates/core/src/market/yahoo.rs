use crate::config::Settings;
use crate::market::types::PricePoint;
use crate::market::MarketDataSource;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_RETRIES: u32 = 3;
const CHART_RANGE: &str = "1y";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) riskpick/0.1";

/// Daily closes from the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl YahooChartSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = settings
            .market_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = settings.market_data_retries.unwrap_or(DEFAULT_RETRIES).max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            retries,
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            yahoo_symbol(symbol)
        )
    }

    async fn fetch_once(&self, symbol: &str) -> Result<FetchOutcome> {
        let res = self
            .http
            .get(self.url(symbol))
            .query(&[("range", CHART_RANGE), ("interval", "1d")])
            .send()
            .await;

        let res = match res {
            Ok(r) => r,
            Err(err) => {
                return Ok(FetchOutcome::Retryable(
                    anyhow::Error::new(err).context("chart request failed"),
                ))
            }
        };

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read chart response")?;

        classify_response(status, &text)
    }
}

/// Unknown symbols read as empty history; throttling and server errors retry.
fn classify_response(status: StatusCode, text: &str) -> Result<FetchOutcome> {
    if status == StatusCode::NOT_FOUND {
        return Ok(FetchOutcome::Done(Vec::new()));
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Ok(FetchOutcome::Retryable(anyhow::anyhow!(
            "chart HTTP {status}: {text}"
        )));
    }
    if !status.is_success() {
        anyhow::bail!("chart HTTP {status}: {text}");
    }

    let parsed = serde_json::from_str::<ChartEnvelope>(text)
        .with_context(|| format!("chart response is not in the expected shape: {text}"))?;
    Ok(FetchOutcome::Done(parse_chart(parsed)?))
}

#[derive(Debug)]
enum FetchOutcome {
    Done(Vec<PricePoint>),
    Retryable(anyhow::Error),
}

#[async_trait::async_trait]
impl MarketDataSource for YahooChartSource {
    fn source_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_history(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(symbol).await? {
                FetchOutcome::Done(points) => return Ok(points),
                FetchOutcome::Retryable(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, %symbol, error = %err, "chart fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Yahoo spells share classes with a dash (BRK-B).
fn yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase().replace('.', "-")
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(envelope: ChartEnvelope) -> Result<Vec<PricePoint>> {
    if let Some(err) = envelope.chart.error {
        if err.code.eq_ignore_ascii_case("not found") {
            return Ok(Vec::new());
        }
        anyhow::bail!("chart error {}: {}", err.code, err.description);
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    anyhow::ensure!(
        closes.len() == result.timestamp.len(),
        "chart timestamp/close length mismatch ({} vs {})",
        result.timestamp.len(),
        closes.len()
    );

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).context("invalid gmtoffset")?;

    let mut out: Vec<PricePoint> = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.into_iter().zip(closes) {
        // Halted sessions come back as nulls.
        let Some(close) = close.filter(|c| c.is_finite()) else {
            continue;
        };
        let date = exchange_date(ts, offset)?;

        // Intraday refreshes can repeat the current session; keep the latest.
        match out.last_mut() {
            Some(last) if last.date == date => last.close = close,
            _ => out.push(PricePoint { date, close }),
        }
    }

    Ok(out)
}

fn exchange_date(ts: i64, offset: FixedOffset) -> Result<NaiveDate> {
    let utc = DateTime::from_timestamp(ts, 0).with_context(|| format!("invalid timestamp {ts}"))?;
    Ok(utc.with_timezone(&offset).date_naive())
}
