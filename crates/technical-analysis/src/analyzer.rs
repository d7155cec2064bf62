use analysis_core::series::value_at;
use analysis_core::{AnalysisError, Horizon, PriceSeries, TradeRecommendation};
use serde::Serialize;

use crate::indicator_set::{IndicatorConfig, IndicatorSet};
use crate::signals::SignalPolicy;

pub struct TechnicalAnalysisEngine;

/// Indicators plus the recommendation derived from them
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalAnalysis {
    pub horizon: Horizon,
    pub indicators: IndicatorSet,
    pub recommendation: TradeRecommendation,
}

/// Newest values of the headline indicators, `None` where undefined
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, series: &PriceSeries, horizon: Horizon) -> Result<TechnicalAnalysis, AnalysisError> {
        let indicators = IndicatorSet::compute(series, &IndicatorConfig::for_horizon(horizon));
        let recommendation = SignalPolicy::for_horizon(horizon).evaluate(series, &indicators)?;

        tracing::info!(
            "{} {}-term: {} over {} bars",
            series.symbol(),
            horizon,
            recommendation.action(),
            series.len()
        );

        Ok(TechnicalAnalysis {
            horizon,
            indicators,
            recommendation,
        })
    }
}

impl TechnicalAnalysis {
    pub fn snapshot(&self, series: &PriceSeries) -> IndicatorSnapshot {
        let last = self.indicators.len().saturating_sub(1);
        let stochastic = self.indicators.stochastic.as_ref();

        IndicatorSnapshot {
            close: series.last_close(),
            rsi: value_at(&self.indicators.rsi, last),
            macd: self.indicators.macd.macd_line.get(last).copied(),
            signal: self.indicators.macd.signal_line.get(last).copied(),
            stochastic_k: stochastic.and_then(|s| value_at(&s.k, last)),
            stochastic_d: stochastic.and_then(|s| value_at(&s.d, last)),
            support: self.indicators.last_support(),
            resistance: self.indicators.last_resistance(),
        }
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
