use analysis_core::series::{centered, lift, rolling_max, rolling_mean, rolling_min, Series};
use analysis_core::PriceBar;
use serde::Serialize;

/// Simple Moving Average, aligned with `data`
pub fn sma(data: &[f64], period: usize) -> Series {
    rolling_mean(&lift(data), period)
}

/// Exponential Moving Average
///
/// Seeded with the first value (not an SMA seed) and smoothed with
/// `alpha = 2 / (period + 1)`, so `ema[0] == data[0]` and every index is
/// defined. A zero period yields an empty result.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let Some(&seed) = data.first() else {
        return vec![];
    };
    if period == 0 {
        return vec![];
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let decay = 1.0 - alpha;
    let norm = decay + alpha;

    let mut result = Vec::with_capacity(data.len());
    result.push(seed);

    let mut prev = seed;
    for &value in &data[1..] {
        // Equal inputs leave the average untouched, so flat stretches stay exact.
        if value != prev {
            prev = (decay * prev + alpha * value) / norm;
        }
        result.push(prev);
    }

    result
}

/// Relative Strength Index over simple rolling averages of gains and losses
///
/// The first bar contributes a zero change, so the value is defined from
/// index `period - 1`. A window without losses reads exactly 100.
pub fn rsi(data: &[f64], period: usize) -> Series {
    let mut gains = Vec::with_capacity(data.len());
    let mut losses = Vec::with_capacity(data.len());

    for i in 0..data.len() {
        let change = if i == 0 { 0.0 } else { data[i] - data[i - 1] };
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => Some(rsi_from_averages(gain.max(0.0), loss.max(0.0))),
            _ => None,
        })
        .collect()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD (Moving Average Convergence Divergence)
#[derive(Debug, Clone, Serialize)]
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Stochastic Oscillator
#[derive(Debug, Clone, Serialize)]
pub struct StochasticResult {
    pub k: Series,
    pub d: Series,
}

/// %K is undefined for bars whose `k_period` range is flat.
pub fn stochastic(bars: &[PriceBar], k_period: usize, d_period: usize) -> StochasticResult {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let highest = rolling_max(&highs, k_period);
    let lowest = rolling_min(&lows, k_period);

    let k: Series = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (lowest[i], highest[i]) {
            (Some(low), Some(high)) if high > low => Some(100.0 * (bar.close - low) / (high - low)),
            _ => None,
        })
        .collect();

    let d = rolling_mean(&k, d_period);

    StochasticResult { k, d }
}

/// Rolling support and resistance bands
#[derive(Debug, Clone, Serialize)]
pub struct SupportResistance {
    pub support: Series,
    pub resistance: Series,
}

/// Centered rolling min of lows and max of highs over `window` bars.
///
/// The newest `(window - 1) / 2` bars never have a full window and stay
/// undefined; use the last defined value as the current level.
pub fn support_resistance(bars: &[PriceBar], window: usize) -> SupportResistance {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    SupportResistance {
        support: centered(&rolling_min(&lows, window), window),
        resistance: centered(&rolling_max(&highs, window), window),
    }
}
