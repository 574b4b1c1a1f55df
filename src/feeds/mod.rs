pub mod yahoo;

use crate::errors::AnalysisResult;
use crate::series::PriceSeries;

/// History windows accepted by the data source.
pub const PERIODS: &[&str] = &["1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

#[inline]
pub fn is_valid_period(period: &str) -> bool {
    PERIODS.contains(&period)
}

/// Source of daily closing prices. Implementations must be safe to call
/// concurrently and must not share mutable caches without synchronization.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Full daily history for `symbol` over `period`.
    /// An empty history is an `UpstreamData` error, never an empty series.
    async fn fetch(&self, symbol: &str, period: &str) -> AnalysisResult<PriceSeries>;
}
