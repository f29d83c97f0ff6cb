use crate::domain::recommendation::ForecastPoint;
use crate::forecast::Forecaster;
use crate::market::types::PricePoint;
use anyhow::{ensure, Result};
use chrono::{Datelike, Duration, NaiveDate};

// Two-sided normal quantile for an 80% interval.
const Z_80: f64 = 1.281_551_565_545;

// Below this many points the weekday effects are mostly noise.
const MIN_POINTS_FOR_SEASONALITY: usize = 14;

/// Additive model: least-squares linear trend plus day-of-week offsets.
///
/// The uncertainty band comes from the residual standard deviation and widens
/// with distance past the last training date.
#[derive(Debug, Clone)]
pub struct TrendForecaster {
    z: f64,
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self { z: Z_80 }
    }
}

impl TrendForecaster {
    pub fn fit(&self, history: &[PricePoint]) -> Result<TrendFit> {
        ensure!(
            history.len() >= 2,
            "need at least 2 training points (got {})",
            history.len()
        );
        ensure!(
            history.iter().all(|p| p.close.is_finite()),
            "training data contains non-finite values"
        );
        ensure!(
            history.windows(2).all(|w| w[0].date < w[1].date),
            "training dates must be strictly increasing"
        );

        let origin = history[0].date;
        let xs: Vec<f64> = history.iter().map(|p| day_offset(origin, p.date)).collect();
        let ys: Vec<f64> = history.iter().map(|p| p.close).collect();
        let n = xs.len() as f64;

        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let mut weekday = [0.0_f64; 7];
        if history.len() >= MIN_POINTS_FOR_SEASONALITY {
            let mut sums = [0.0_f64; 7];
            let mut counts = [0usize; 7];
            for (p, (x, y)) in history.iter().zip(xs.iter().zip(&ys)) {
                let w = p.date.weekday().num_days_from_monday() as usize;
                sums[w] += y - (intercept + slope * x);
                counts[w] += 1;
            }

            let seen = counts.iter().filter(|c| **c > 0).count() as f64;
            let mut total = 0.0;
            for w in 0..7 {
                if counts[w] > 0 {
                    weekday[w] = sums[w] / counts[w] as f64;
                    total += weekday[w];
                }
            }
            // Center over observed weekdays so the trend keeps the level.
            let center = total / seen;
            for w in 0..7 {
                if counts[w] > 0 {
                    weekday[w] -= center;
                }
            }
        }

        let mut fit = TrendFit {
            origin,
            last: history[history.len() - 1].date,
            n: history.len(),
            intercept,
            slope,
            weekday,
            sigma: 0.0,
        };

        let sse: f64 = history
            .iter()
            .map(|p| (p.close - fit.predict(p.date)).powi(2))
            .sum();
        let dof = history.len().saturating_sub(2);
        fit.sigma = if dof == 0 { 0.0 } else { (sse / dof as f64).sqrt() };

        Ok(fit)
    }
}

#[derive(Debug, Clone)]
pub struct TrendFit {
    origin: NaiveDate,
    last: NaiveDate,
    n: usize,
    intercept: f64,
    slope: f64,
    weekday: [f64; 7],
    sigma: f64,
}

impl TrendFit {
    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn predict(&self, date: NaiveDate) -> f64 {
        let w = date.weekday().num_days_from_monday() as usize;
        self.intercept + self.slope * day_offset(self.origin, date) + self.weekday[w]
    }

    fn point(&self, date: NaiveDate, z: f64) -> ForecastPoint {
        let predicted = self.predict(date);
        let ahead = day_offset(self.last, date).max(0.0);
        let half = z * self.sigma * (1.0 + ahead / self.n as f64).sqrt();
        ForecastPoint {
            date,
            predicted,
            lower: predicted - half,
            upper: predicted + half,
        }
    }
}

fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

#[async_trait::async_trait]
impl Forecaster for TrendForecaster {
    fn model_name(&self) -> &'static str {
        "linear_trend_weekday"
    }

    async fn forecast(&self, history: &[PricePoint], horizon_days: u32) -> Result<Vec<ForecastPoint>> {
        let fit = self.fit(history)?;

        let mut out = Vec::with_capacity(history.len() + horizon_days as usize);
        for p in history {
            out.push(fit.point(p.date, self.z));
        }
        for step in 1..=i64::from(horizon_days) {
            out.push(fit.point(fit.last + Duration::days(step), self.z));
        }
        Ok(out)
    }
}
