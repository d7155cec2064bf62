use std::collections::BTreeMap;

use analysis_core::series::{last_defined, Series};
use analysis_core::{Horizon, PriceSeries};
use serde::Serialize;

use crate::indicators::{self, MacdResult, StochasticResult};

/// Which indicators to compute and with what periods
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// `(k_period, d_period)`, or `None` to skip the stochastic oscillator
    pub stochastic: Option<(usize, usize)>,
    pub support_resistance_window: usize,
}

impl IndicatorConfig {
    pub fn short_term() -> Self {
        Self {
            sma_periods: vec![10, 20],
            ema_periods: vec![10, 20],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stochastic: Some((14, 3)),
            support_resistance_window: 10,
        }
    }

    pub fn long_term() -> Self {
        Self {
            sma_periods: vec![50, 200],
            ema_periods: vec![],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stochastic: None,
            support_resistance_window: 20,
        }
    }

    pub fn for_horizon(horizon: Horizon) -> Self {
        match horizon {
            Horizon::Short => Self::short_term(),
            Horizon::Long => Self::long_term(),
        }
    }
}

/// Derived sequences aligned index-for-index with a [`PriceSeries`]
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSet {
    pub sma: BTreeMap<usize, Series>,
    pub ema: BTreeMap<usize, Vec<f64>>,
    pub rsi: Series,
    pub macd: MacdResult,
    pub stochastic: Option<StochasticResult>,
    pub support: Series,
    pub resistance: Series,
}

impl IndicatorSet {
    pub fn compute(series: &PriceSeries, config: &IndicatorConfig) -> Self {
        let closes = series.closes();
        let bars = series.bars();

        let sma = config
            .sma_periods
            .iter()
            .map(|&period| (period, indicators::sma(&closes, period)))
            .collect();

        let ema = config
            .ema_periods
            .iter()
            .map(|&period| (period, indicators::ema(&closes, period)))
            .collect();

        let sr = indicators::support_resistance(bars, config.support_resistance_window);

        Self {
            sma,
            ema,
            rsi: indicators::rsi(&closes, config.rsi_period),
            macd: indicators::macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal),
            stochastic: config
                .stochastic
                .map(|(k_period, d_period)| indicators::stochastic(bars, k_period, d_period)),
            support: sr.support,
            resistance: sr.resistance,
        }
    }

    /// Number of bars the set is aligned with
    pub fn len(&self) -> usize {
        self.macd.macd_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sma(&self, period: usize) -> Option<&Series> {
        self.sma.get(&period)
    }

    pub fn ema(&self, period: usize) -> Option<&[f64]> {
        self.ema.get(&period).map(Vec::as_slice)
    }

    pub fn last_support(&self) -> Option<f64> {
        last_defined(&self.support)
    }

    pub fn last_resistance(&self) -> Option<f64> {
        last_defined(&self.resistance)
    }
}
