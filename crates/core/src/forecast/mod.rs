pub mod trend;

use crate::domain::recommendation::ForecastPoint;
use crate::market::types::PricePoint;

#[async_trait::async_trait]
pub trait Forecaster: Send + Sync {
    fn model_name(&self) -> &'static str;

    /// Fitted values over the training span followed by `horizon_days` daily predictions.
    async fn forecast(
        &self,
        history: &[PricePoint],
        horizon_days: u32,
    ) -> anyhow::Result<Vec<ForecastPoint>>;
}
