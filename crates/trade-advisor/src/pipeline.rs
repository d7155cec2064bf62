use analysis_core::{
    AnalysisError, FundamentalScore, FundamentalSnapshot, Horizon, MarketDataSource, PriceSeries,
};
use fundamental_analysis::{FundamentalAnalysisEngine, MAX_SCORE};
use serde::Serialize;
use technical_analysis::{TechnicalAnalysis, TechnicalAnalysisEngine};

/// Everything one run produces, ready for the report and the charts
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub series: PriceSeries,
    pub technical: TechnicalAnalysis,
    pub fundamentals: Option<FundamentalReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FundamentalReport {
    pub snapshot: FundamentalSnapshot,
    pub score: FundamentalScore,
}

impl AnalysisReport {
    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn horizon(&self) -> Horizon {
        self.technical.horizon
    }
}

/// Fetch data for `symbol` and run the pipeline for `horizon`.
///
/// Short-term is technical only. Long-term also scores fundamentals, which
/// are fetched only once price data is known to exist.
pub async fn run_analysis<S>(source: &S, symbol: &str, horizon: Horizon) -> Result<AnalysisReport, AnalysisError>
where
    S: MarketDataSource + ?Sized,
{
    let symbol = normalize_symbol(symbol)?;

    tracing::info!("Fetching {} days of daily bars for {}", horizon.lookback_days(), symbol);
    let bars = source.daily_bars(&symbol, horizon.lookback_days()).await?;
    let series = PriceSeries::new(symbol.as_str(), bars)?;
    tracing::debug!("{}: {} bars from {}", symbol, series.len(), series.bars()[0].date);

    let fundamentals = match horizon {
        Horizon::Short => None,
        Horizon::Long => Some(score_fundamentals(source, &symbol).await?),
    };

    let technical = TechnicalAnalysisEngine::new().analyze(&series, horizon)?;

    Ok(AnalysisReport {
        series,
        technical,
        fundamentals,
    })
}

async fn score_fundamentals<S>(source: &S, symbol: &str) -> Result<FundamentalReport, AnalysisError>
where
    S: MarketDataSource + ?Sized,
{
    let ratios = source.fundamental_ratios(symbol).await?;
    let eps_history = source.annual_eps(symbol).await?;

    let engine = FundamentalAnalysisEngine::new();
    let snapshot = engine.snapshot(ratios, &eps_history);
    let score = engine.score(&snapshot);

    tracing::info!("{} fundamental score {}/{}", symbol, score.score, MAX_SCORE);

    Ok(FundamentalReport { snapshot, score })
}

/// Upper-case and trim a ticker; an empty one is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, AnalysisError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AnalysisError::InvalidInput("ticker must not be empty".to_string()));
    }
    Ok(symbol)
}
