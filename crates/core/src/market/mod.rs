pub mod types;
pub mod yahoo;

use crate::market::types::PricePoint;
use anyhow::Result;

#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// Daily closes in ascending date order. Unknown symbols yield an empty vector.
    async fn fetch_history(&self, symbol: &str) -> Result<Vec<PricePoint>>;
}
