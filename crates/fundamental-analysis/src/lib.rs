use analysis_core::{FundamentalRatios, FundamentalScore, FundamentalSnapshot};

pub const MAX_SCORE: u8 = 5;

pub const REASON_PE: &str = "High or missing P/E ratio";
pub const REASON_DEBT: &str = "High or missing Debt-to-Equity";
pub const REASON_ROE: &str = "Low or missing ROE";
pub const REASON_EPS_GROWTH: &str = "Negative or missing EPS growth";
pub const REASON_DIVIDEND: &str = "No or missing dividend yield";

/// One pass/fail quality rule. A missing value always fails.
struct Rule {
    reason: &'static str,
    passes: fn(&FundamentalSnapshot) -> bool,
}

// Evaluation order is also the order reasons are reported in.
const RULES: [Rule; 5] = [
    Rule {
        reason: REASON_PE,
        passes: |s| s.pe_ratio.is_some_and(|pe| pe > 0.0 && pe < 30.0),
    },
    Rule {
        // Percent convention: 100 means debt equals equity
        reason: REASON_DEBT,
        passes: |s| s.debt_to_equity.is_some_and(|de| de < 100.0),
    },
    Rule {
        reason: REASON_ROE,
        passes: |s| s.return_on_equity.is_some_and(|roe| roe > 0.15),
    },
    Rule {
        reason: REASON_EPS_GROWTH,
        passes: |s| s.eps_growth.is_some_and(|g| g > 0.0),
    },
    Rule {
        reason: REASON_DIVIDEND,
        passes: |s| s.dividend_yield.is_some_and(|y| y > 0.0),
    },
];

pub struct FundamentalAnalysisEngine;

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Assemble a snapshot from provider ratios and annual EPS history
    /// (oldest first).
    pub fn snapshot(&self, ratios: FundamentalRatios, eps_history: &[f64]) -> FundamentalSnapshot {
        FundamentalSnapshot::new(sanitize(ratios), eps_growth(eps_history))
    }

    /// Score a snapshot against the five quality rules.
    pub fn score(&self, snapshot: &FundamentalSnapshot) -> FundamentalScore {
        let mut score = 0;
        let mut reasons = Vec::new();

        for rule in &RULES {
            if (rule.passes)(snapshot) {
                score += 1;
            } else {
                reasons.push(rule.reason.to_string());
            }
        }

        tracing::debug!("fundamental score {}/{}, failed: {:?}", score, MAX_SCORE, reasons);

        FundamentalScore { score, reasons }
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Growth between the two most recent annual EPS figures, relative to the
/// magnitude of the earlier one.
///
/// `None` with fewer than two periods, a zero previous value, or a
/// non-finite figure.
pub fn eps_growth(eps_history: &[f64]) -> Option<f64> {
    let [.., previous, latest] = eps_history else {
        return None;
    };
    if !previous.is_finite() || !latest.is_finite() || *previous == 0.0 {
        return None;
    }
    Some((latest - previous) / previous.abs())
}

/// Providers occasionally send NaN or infinities; treat those as missing.
fn sanitize(ratios: FundamentalRatios) -> FundamentalRatios {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
    FundamentalRatios {
        pe_ratio: finite(ratios.pe_ratio),
        dividend_yield: finite(ratios.dividend_yield),
        debt_to_equity: finite(ratios.debt_to_equity),
        return_on_equity: finite(ratios.return_on_equity),
    }
}
