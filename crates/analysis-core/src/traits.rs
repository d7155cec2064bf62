use async_trait::async_trait;
use crate::{AnalysisError, FundamentalRatios, PriceBar};

/// Trait for market data providers
///
/// Empty results are data, not errors: an empty bar list or an absent ratio
/// is how a provider says it has nothing for the ticker.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars covering the last `lookback_days` calendar days, oldest first.
    async fn daily_bars(&self, symbol: &str, lookback_days: i64) -> Result<Vec<PriceBar>, AnalysisError>;

    async fn fundamental_ratios(&self, symbol: &str) -> Result<FundamentalRatios, AnalysisError>;

    /// Annual EPS figures, oldest first.
    async fn annual_eps(&self, symbol: &str) -> Result<Vec<f64>, AnalysisError>;
}
