use analysis_core::series::value_at;
use analysis_core::{AnalysisError, Horizon, PriceSeries, TradeLevels, TradeRecommendation};

use crate::indicator_set::IndicatorSet;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// SMA pair compared when no MACD crossover fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFallback {
    pub fast_period: usize,
    pub slow_period: usize,
}

/// Threshold rules turning the latest indicator values into a recommendation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPolicy {
    /// Stop-loss distance from entry, as a fraction
    pub slippage: f64,
    pub duration_days: u32,
    pub trend_fallback: Option<TrendFallback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Bullish,
    Bearish,
}

impl SignalPolicy {
    pub fn short_term() -> Self {
        Self {
            slippage: 0.02,
            duration_days: 30,
            trend_fallback: None,
        }
    }

    pub fn long_term() -> Self {
        Self {
            slippage: 0.03,
            duration_days: 180,
            trend_fallback: Some(TrendFallback {
                fast_period: 50,
                slow_period: 200,
            }),
        }
    }

    pub fn for_horizon(horizon: Horizon) -> Self {
        match horizon {
            Horizon::Short => Self::short_term(),
            Horizon::Long => Self::long_term(),
        }
    }

    /// Classify the newest bar as Buy, Sell or Hold.
    ///
    /// MACD, Signal and RSI are read at the literal last two indices, while
    /// entry and target come from the last *defined* support/resistance,
    /// which trails the newest bar by half a window.
    pub fn evaluate(
        &self,
        series: &PriceSeries,
        indicators: &IndicatorSet,
    ) -> Result<TradeRecommendation, AnalysisError> {
        let n = indicators.len();
        if n < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "{}: need at least 2 bars to detect a MACD crossover, got {}",
                series.symbol(),
                n
            )));
        }

        let direction = match self.crossover(indicators, n) {
            Some(direction) => Some(direction),
            None => self.trend(indicators, n),
        };

        let Some(direction) = direction else {
            tracing::debug!("{}: no crossover or trend signal, holding", series.symbol());
            return Ok(TradeRecommendation::Hold);
        };

        let (Some(support), Some(resistance)) = (indicators.last_support(), indicators.last_resistance())
        else {
            return Err(AnalysisError::InsufficientData(format!(
                "{}: {} bars are too few to place support/resistance levels",
                series.symbol(),
                n
            )));
        };

        let recommendation = match direction {
            Direction::Bullish => TradeRecommendation::Buy(TradeLevels {
                entry_price: support,
                target_price: resistance,
                stop_loss: support * (1.0 - self.slippage),
                duration_days: self.duration_days,
            }),
            Direction::Bearish => TradeRecommendation::Sell(TradeLevels {
                entry_price: resistance,
                target_price: support,
                stop_loss: resistance * (1.0 + self.slippage),
                duration_days: self.duration_days,
            }),
        };

        Ok(recommendation)
    }

    /// MACD crossing its signal line on the newest bar, gated by RSI.
    fn crossover(&self, indicators: &IndicatorSet, n: usize) -> Option<Direction> {
        let macd = &indicators.macd.macd_line;
        let signal = &indicators.macd.signal_line;
        let rsi = value_at(&indicators.rsi, n - 1);

        let crossed_up = macd[n - 2] < signal[n - 2] && macd[n - 1] > signal[n - 1];
        let crossed_down = macd[n - 2] > signal[n - 2] && macd[n - 1] < signal[n - 1];

        if crossed_up && rsi.is_some_and(|r| r < RSI_OVERBOUGHT) {
            tracing::debug!("bullish MACD crossover, RSI {:?}", rsi);
            Some(Direction::Bullish)
        } else if crossed_down && rsi.is_some_and(|r| r > RSI_OVERSOLD) {
            tracing::debug!("bearish MACD crossover, RSI {:?}", rsi);
            Some(Direction::Bearish)
        } else {
            None
        }
    }

    /// Fast SMA above/below slow SMA on the newest bar, gated by RSI.
    fn trend(&self, indicators: &IndicatorSet, n: usize) -> Option<Direction> {
        let fallback = self.trend_fallback?;
        let fast = value_at(indicators.sma(fallback.fast_period)?, n - 1)?;
        let slow = value_at(indicators.sma(fallback.slow_period)?, n - 1)?;
        let rsi = value_at(&indicators.rsi, n - 1);

        if fast > slow && rsi.is_some_and(|r| r < RSI_OVERBOUGHT) {
            tracing::debug!("SMA{} above SMA{}, trend fallback says buy", fallback.fast_period, fallback.slow_period);
            Some(Direction::Bullish)
        } else if fast < slow && rsi.is_some_and(|r| r > RSI_OVERSOLD) {
            tracing::debug!("SMA{} below SMA{}, trend fallback says sell", fallback.fast_period, fallback.slow_period);
            Some(Direction::Bearish)
        } else {
            None
        }
    }
}
