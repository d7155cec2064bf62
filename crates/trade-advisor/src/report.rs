use analysis_core::{AnalysisError, Horizon, TradeRecommendation};
use fundamental_analysis::MAX_SCORE;
use technical_analysis::IndicatorSnapshot;

use crate::pipeline::{AnalysisReport, FundamentalReport};

pub const INVALID_MODE: &str = "Invalid input. Please enter 'short' or 'long'.";

const SHORT_TERM_HOLD: &str =
    "No clear Buy or Sell trend signal detected based on MACD and RSI. Recommendation: HOLD.";
const LONG_TERM_HOLD: &str =
    "No clear actionable trading signal detected based on technical indicators. Consider holding.";

const TABLE_HEADERS: [&str; 5] = ["Action", "Entry Price", "Target Price", "Stop Loss", "Duration (days)"];

/// Full console report for one run
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();

    if let Some(fundamentals) = &report.fundamentals {
        out.push_str(&render_fundamentals(fundamentals));
        out.push('\n');
    }

    out.push_str(&render_recommendation(report.horizon(), &report.technical.recommendation));
    out.push('\n');
    out.push_str(&render_indicator_summary(&report.technical.snapshot(&report.series)));
    out.push('\n');

    out
}

pub fn render_fundamentals(fundamentals: &FundamentalReport) -> String {
    let s = &fundamentals.snapshot;
    let metrics = [
        ("P/E Ratio", fmt_value(s.pe_ratio, 2)),
        ("Dividend Yield", fmt_value(s.dividend_yield, 4)),
        ("Debt to Equity (D/E)", fmt_value(s.debt_to_equity, 2)),
        ("Return on Equity (ROE)", fmt_value(s.return_on_equity, 4)),
        ("EPS Growth (most recent)", fmt_value(s.eps_growth, 4)),
    ];

    let mut out = String::from("Fundamental Metrics:\n");
    for (name, value) in metrics {
        out.push_str(&format!(" {}: {}\n", name, value));
    }

    out.push_str(&format!(
        "\nFundamental quality score: {}/{}\n",
        fundamentals.score.score, MAX_SCORE
    ));
    if fundamentals.score.reasons.is_empty() {
        out.push_str(" Fundamentals look solid.\n");
    } else {
        out.push_str(&format!(" Considerations: {}\n", fundamentals.score.reasons.join(", ")));
    }

    out
}

pub fn render_recommendation(horizon: Horizon, recommendation: &TradeRecommendation) -> String {
    let mut out = format!("Technical analysis suggests: {}\n", recommendation.action());

    match recommendation.levels() {
        Some(levels) => {
            if horizon == Horizon::Short {
                out.push_str("\nSuggested Single Trade Action Based on Current Trend:\n\n");
            }
            let row = [
                recommendation.action().to_string(),
                format!("{:.2}", levels.entry_price),
                format!("{:.2}", levels.target_price),
                format!("{:.2}", levels.stop_loss),
                levels.duration_days.to_string(),
            ];
            out.push_str(&grid_table(&TABLE_HEADERS, &row));
        }
        None => {
            let hold = match horizon {
                Horizon::Short => SHORT_TERM_HOLD,
                Horizon::Long => LONG_TERM_HOLD,
            };
            out.push_str(hold);
            out.push('\n');
        }
    }

    out
}

pub fn render_indicator_summary(snapshot: &IndicatorSnapshot) -> String {
    let mut parts = vec![
        format!("Close {:.2}", snapshot.close),
        format!("RSI {}", fmt_value(snapshot.rsi, 2)),
        format!("MACD {}", fmt_value(snapshot.macd, 4)),
        format!("Signal {}", fmt_value(snapshot.signal, 4)),
    ];
    if snapshot.stochastic_k.is_some() || snapshot.stochastic_d.is_some() {
        parts.push(format!("%K {}", fmt_value(snapshot.stochastic_k, 2)));
        parts.push(format!("%D {}", fmt_value(snapshot.stochastic_d, 2)));
    }
    parts.push(format!("Support {}", fmt_value(snapshot.support, 2)));
    parts.push(format!("Resistance {}", fmt_value(snapshot.resistance, 2)));

    format!("Latest indicators: {}\n", parts.join(" | "))
}

/// Machine-readable summary for `--json`
pub fn render_json(report: &AnalysisReport) -> serde_json::Result<String> {
    let summary = serde_json::json!({
        "symbol": report.symbol(),
        "horizon": report.horizon().as_str(),
        "bars": report.series.len(),
        "recommendation": report.technical.recommendation,
        "latest": report.technical.snapshot(&report.series),
        "fundamentals": report.fundamentals,
    });
    serde_json::to_string_pretty(&summary)
}

/// One line for the user when a run cannot complete
pub fn error_message(err: &AnalysisError, horizon: Horizon) -> String {
    match err {
        AnalysisError::DataUnavailable(_) => match horizon {
            Horizon::Short => "Invalid stock ticker or no data found.".to_string(),
            Horizon::Long => "Failed to fetch price data.".to_string(),
        },
        AnalysisError::InsufficientData(msg) => format!("Not enough price history to evaluate signals: {}", msg),
        AnalysisError::InvalidInput(msg) => format!("Invalid input: {}", msg),
        AnalysisError::ApiError(msg) => format!("Market data request failed: {}", msg),
    }
}

fn fmt_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

/// Single-row table in the `+---+` grid style. The first column is
/// left-aligned, the numeric ones right-aligned.
fn grid_table(headers: &[&str], row: &[String]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .zip(row)
        .map(|(h, cell)| h.len().max(cell.len()) + 2)
        .collect();

    let border = |fill: char| {
        let mut line = String::from("+");
        for width in &widths {
            line.extend(std::iter::repeat(fill).take(*width));
            line.push('+');
        }
        line.push('\n');
        line
    };

    let line = |cells: &[&str]| {
        let mut out = String::from("|");
        for (i, (cell, width)) in cells.iter().zip(&widths).enumerate() {
            let inner = width - 2;
            if i == 0 {
                out.push_str(&format!(" {:<inner$} |", cell, inner = inner));
            } else {
                out.push_str(&format!(" {:>inner$} |", cell, inner = inner));
            }
        }
        out.push('\n');
        out
    };

    let row_cells: Vec<&str> = row.iter().map(String::as_str).collect();

    let mut out = border('-');
    out.push_str(&line(headers));
    out.push_str(&border('='));
    out.push_str(&line(row_cells.as_slice()));
    out.push_str(&border('-'));
    out
}
