use analysis_core::{Horizon, Series};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::pipeline::AnalysisReport;

const PRICE_SIZE: (u32, u32) = (1400, 700);
const OSCILLATOR_SIZE: (u32, u32) = (1400, 400);

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const GREY: RGBColor = RGBColor(128, 128, 128);

struct ChartLine {
    label: String,
    values: Series,
    color: RGBColor,
}

impl ChartLine {
    fn new(label: impl Into<String>, values: Series, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            values,
            color,
        }
    }

    fn dense(label: impl Into<String>, values: &[f64], color: RGBColor) -> Self {
        Self::new(label, values.iter().copied().map(Some).collect(), color)
    }

    fn level(label: impl Into<String>, value: f64, len: usize, color: RGBColor) -> Self {
        Self::new(label, vec![Some(value); len], color)
    }
}

struct ChartLayout {
    name: &'static str,
    title: String,
    y_desc: &'static str,
    size: (u32, u32),
    lines: Vec<ChartLine>,
}

/// Write the horizon's charts as SVG files under `dir` and return their paths.
pub fn render_charts(report: &AnalysisReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create chart directory {}", dir.display()))?;

    let dates = report.series.dates();
    let mut written = Vec::new();

    for layout in chart_layouts(report) {
        let path = dir.join(chart_file_name(report.symbol(), report.horizon(), layout.name));
        draw_chart(&path, &layout, &dates)?;
        tracing::debug!("Wrote {}", path.display());
        written.push(path);
    }

    tracing::info!("Wrote {} charts to {}", written.len(), dir.display());
    Ok(written)
}

fn chart_layouts(report: &AnalysisReport) -> Vec<ChartLayout> {
    let symbol = report.symbol();
    let horizon = report.horizon();
    let indicators = &report.technical.indicators;
    let closes = report.series.closes();
    let n = closes.len();

    let mut layouts = Vec::new();

    let mut price_lines = vec![ChartLine::dense("Close Price", &closes, BLACK)];
    let sma_colors = [BLUE, ORANGE];
    for ((period, values), color) in indicators.sma.iter().zip(sma_colors) {
        price_lines.push(ChartLine::new(format!("SMA {}", period), values.clone(), color));
    }
    price_lines.push(ChartLine::new("Support", indicators.support.clone(), GREEN));
    price_lines.push(ChartLine::new("Resistance", indicators.resistance.clone(), RED));
    layouts.push(ChartLayout {
        name: "price",
        title: format!("{} - SMA, Support & Resistance", symbol),
        y_desc: "Price",
        size: PRICE_SIZE,
        lines: price_lines,
    });

    if horizon == Horizon::Short && !indicators.ema.is_empty() {
        let mut ema_lines = vec![ChartLine::dense("Close Price", &closes, BLACK)];
        let ema_colors = [GREEN, RED];
        for ((period, values), color) in indicators.ema.iter().zip(ema_colors) {
            ema_lines.push(ChartLine::dense(format!("EMA {}", period), values, color));
        }
        layouts.push(ChartLayout {
            name: "ema",
            title: format!("{} - EMA", symbol),
            y_desc: "Price",
            size: PRICE_SIZE,
            lines: ema_lines,
        });
    }

    layouts.push(ChartLayout {
        name: "rsi",
        title: format!("{} - RSI", symbol),
        y_desc: "RSI Value",
        size: OSCILLATOR_SIZE,
        lines: vec![
            ChartLine::new("RSI (14)", indicators.rsi.clone(), PURPLE),
            ChartLine::level("Overbought (70)", 70.0, n, RED),
            ChartLine::level("Oversold (30)", 30.0, n, GREEN),
        ],
    });

    layouts.push(ChartLayout {
        name: "macd",
        title: format!("{} - MACD", symbol),
        y_desc: "MACD",
        size: OSCILLATOR_SIZE,
        lines: vec![
            ChartLine::dense("MACD", &indicators.macd.macd_line, BLUE),
            ChartLine::dense("Signal Line", &indicators.macd.signal_line, ORANGE),
            ChartLine::level("Zero", 0.0, n, GREY),
        ],
    });

    if let Some(stochastic) = &indicators.stochastic {
        layouts.push(ChartLayout {
            name: "stochastic",
            title: format!("{} - Stochastic Oscillator", symbol),
            y_desc: "Value",
            size: OSCILLATOR_SIZE,
            lines: vec![
                ChartLine::new("%K", stochastic.k.clone(), BLUE),
                ChartLine::new("%D", stochastic.d.clone(), ORANGE),
                ChartLine::level("Overbought (80)", 80.0, n, RED),
                ChartLine::level("Oversold (20)", 20.0, n, GREEN),
            ],
        });
    }

    layouts
}

fn draw_chart(path: &Path, layout: &ChartLayout, dates: &[NaiveDate]) -> Result<()> {
    let (y_min, y_max) = value_range(&layout.lines).ok_or_else(|| anyhow!("nothing to plot for {}", layout.title))?;
    let x_max = dates.len().saturating_sub(1).max(1) as f64;

    let root = SVGBackend::new(path, layout.size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&layout.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)
        .map_err(draw_error)?;

    let date_label = |x: &f64| {
        dates
            .get(x.round().max(0.0) as usize)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&date_label)
        .x_desc("Date")
        .y_desc(layout.y_desc)
        .draw()
        .map_err(draw_error)?;

    for line in &layout.lines {
        let color = line.color;
        let mut labelled = false;
        for segment in segments(&line.values) {
            let series = chart
                .draw_series(LineSeries::new(segment, color.stroke_width(2)))
                .map_err(draw_error)?;
            if !labelled {
                series
                    .label(line.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                labelled = true;
            }
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(draw_error)?;

    root.present().map_err(draw_error)?;
    Ok(())
}

fn draw_error<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("chart rendering failed: {}", err)
}

/// Split a series into runs of defined points, indexed by bar.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Padded y-range over every defined value, `None` if there is nothing to draw.
fn value_range(lines: &[ChartLine]) -> Option<(f64, f64)> {
    let mut defined = lines.iter().flat_map(|l| l.values.iter().flatten().copied());
    let first = defined.next()?;
    let (min, max) = defined.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some((min - pad, max + pad))
}

fn chart_file_name(symbol: &str, horizon: Horizon, chart: &str) -> String {
    let safe: String = symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}_{}.svg", safe, horizon.as_str(), chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AnalysisReport;
    use analysis_core::{PriceBar, PriceSeries};
    use technical_analysis::TechnicalAnalysisEngine;

    fn sample_report(len: usize, horizon: Horizon) -> AnalysisReport {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = (0..len)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 5.0;
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect();
        let series = PriceSeries::new("INFY.NS", bars).unwrap();
        let technical = TechnicalAnalysisEngine::new().analyze(&series, horizon).unwrap();

        AnalysisReport {
            series,
            technical,
            fundamentals: None,
        }
    }

    #[test]
    fn test_segments_split_on_gaps() {
        let values = vec![None, Some(1.0), Some(2.0), None, None, Some(3.0), None];
        let runs = segments(&values);

        assert_eq!(runs, vec![vec![(1.0, 1.0), (2.0, 2.0)], vec![(5.0, 3.0)]]);
        assert!(segments(&[None, None]).is_empty());
    }

    #[test]
    fn test_value_range() {
        let lines = vec![
            ChartLine::new("a", vec![None, Some(10.0), Some(20.0)], BLACK),
            ChartLine::new("b", vec![Some(15.0), None], BLACK),
        ];
        let (lo, hi) = value_range(&lines).unwrap();
        assert!(lo < 10.0 && lo > 9.0);
        assert!(hi > 20.0 && hi < 21.0);

        let flat = vec![ChartLine::level("zero", 0.0, 3, GREY)];
        assert_eq!(value_range(&flat), Some((-1.0, 1.0)));

        let empty = vec![ChartLine::new("none", vec![None, None], BLACK)];
        assert_eq!(value_range(&empty), None);
    }

    #[test]
    fn test_chart_file_name() {
        assert_eq!(chart_file_name("INFY.NS", Horizon::Short, "rsi"), "INFY.NS_short_rsi.svg");
        assert_eq!(chart_file_name("BRK/B", Horizon::Long, "price"), "BRK_B_long_price.svg");
    }

    #[test]
    fn test_chart_sets_per_horizon() {
        let short: Vec<_> = chart_layouts(&sample_report(60, Horizon::Short)).into_iter().map(|s| s.name).collect();
        assert_eq!(short, vec!["price", "ema", "rsi", "macd", "stochastic"]);

        let long: Vec<_> = chart_layouts(&sample_report(60, Horizon::Long)).into_iter().map(|s| s.name).collect();
        assert_eq!(long, vec!["price", "rsi", "macd"]);
    }

    #[test]
    fn test_render_charts_writes_svg_files() {
        let dir = std::env::temp_dir().join(format!("trade-advisor-charts-{}", std::process::id()));
        let report = sample_report(60, Horizon::Short);

        let paths = render_charts(&report, &dir).unwrap();

        assert_eq!(paths.len(), 5);
        for path in &paths {
            let contents = std::fs::read_to_string(path).unwrap();
            assert!(contents.contains("<svg"));
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
