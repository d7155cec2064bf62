use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// One trading day of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Daily bars for one ticker, ordered by date ascending. Never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "no price data found for {}",
                symbol
            )));
        }
        bars.sort_by_key(|b| b.date);
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn last_close(&self) -> f64 {
        // Non-empty by construction.
        self.bars[self.bars.len() - 1].close
    }
}

/// Analysis horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Horizon {
    Short,
    Long,
}

impl Horizon {
    /// Calendar days of price history requested from the data source
    pub fn lookback_days(&self) -> i64 {
        match self {
            Horizon::Short => 182,
            Horizon::Long => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Short => "short",
            Horizon::Long => "long",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Horizon::Short),
            "long" => Ok(Horizon::Long),
            other => Err(AnalysisError::InvalidInput(format!(
                "unknown view '{}', expected 'short' or 'long'",
                other
            ))),
        }
    }
}

/// Ratio snapshot as reported by the data provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRatios {
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    /// Percent convention: 50.0 means liabilities are half of equity.
    pub debt_to_equity: Option<f64>,
    /// Fraction: 0.20 means 20%.
    pub return_on_equity: Option<f64>,
}

/// Fundamentals consumed by the scorer. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalSnapshot {
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub eps_growth: Option<f64>,
}

impl FundamentalSnapshot {
    pub fn new(ratios: FundamentalRatios, eps_growth: Option<f64>) -> Self {
        Self {
            pe_ratio: ratios.pe_ratio,
            dividend_yield: ratios.dividend_yield,
            debt_to_equity: ratios.debt_to_equity,
            return_on_equity: ratios.return_on_equity,
            eps_growth,
        }
    }
}

/// Result of the five fundamental quality rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalScore {
    /// Passed rules, 0 to 5
    pub score: u8,
    /// One message per failed rule, in rule order
    pub reasons: Vec<String>,
}

/// Trade action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn to_label(&self) -> &'static str {
        match self {
            TradeAction::Buy => "Buy",
            TradeAction::Sell => "Sell",
            TradeAction::Hold => "Hold",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// Price levels attached to an actionable recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub duration_days: u32,
}

/// Single recommendation for the current state of a ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TradeRecommendation {
    Buy(TradeLevels),
    Sell(TradeLevels),
    Hold,
}

impl TradeRecommendation {
    pub fn action(&self) -> TradeAction {
        match self {
            TradeRecommendation::Buy(_) => TradeAction::Buy,
            TradeRecommendation::Sell(_) => TradeAction::Sell,
            TradeRecommendation::Hold => TradeAction::Hold,
        }
    }

    pub fn levels(&self) -> Option<&TradeLevels> {
        match self {
            TradeRecommendation::Buy(levels) | TradeRecommendation::Sell(levels) => Some(levels),
            TradeRecommendation::Hold => None,
        }
    }
}

/// Annual filing figures used to derive fundamental ratios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Financials {
    pub symbol: String,
    pub fiscal_year: i32,
    pub eps: Option<f64>,
    pub net_income: Option<f64>,
    pub long_term_debt: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub shareholders_equity: Option<f64>,
}
