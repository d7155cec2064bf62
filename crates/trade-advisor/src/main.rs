mod charts;
mod config;
mod pipeline;
mod report;

use analysis_core::Horizon;
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use polygon_client::PolygonClient;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AdvisorConfig;

const TICKER_PROMPT: &str = "Enter stock ticker (e.g., AAPL, MSFT): ";

#[derive(Parser, Debug)]
#[command(version, about = "Short- and long-term stock trade suggestions from technical and fundamental analysis")]
struct Cli {
    /// Ticker symbol, e.g. AAPL (prompted for when omitted)
    ticker: Option<String>,

    /// Analysis view: short or long (prompted for when omitted)
    #[arg(long)]
    mode: Option<String>,

    /// Skip writing chart files
    #[arg(long)]
    no_charts: bool,

    /// Directory for chart files (overrides CHART_DIR)
    #[arg(long, value_name = "DIR")]
    chart_dir: Option<PathBuf>,

    /// Print a JSON summary instead of the text report
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("run failed: {:?}", err);
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ticker = match cli.ticker {
        Some(ticker) => ticker,
        None => prompt(TICKER_PROMPT)?,
    };
    let mode = match cli.mode {
        Some(mode) => mode,
        None => prompt("Enter view (short/long): ")?,
    };

    let Ok(horizon) = mode.parse::<Horizon>() else {
        bail!(report::INVALID_MODE);
    };

    let mut config = AdvisorConfig::from_env()?;
    if cli.no_charts {
        config.render_charts = false;
    }
    if let Some(dir) = cli.chart_dir {
        config.chart_dir = dir;
    }

    let client = PolygonClient::new(
        config.polygon_api_key.clone(),
        config.rate_limit_per_minute,
        config.request_timeout,
    )?;

    if !cli.json {
        println!("\n--- Running {} TERM Analysis ---\n", horizon.as_str().to_uppercase());
    }

    let analysis = pipeline::run_analysis(&client, &ticker, horizon)
        .await
        .map_err(|err| anyhow!(report::error_message(&err, horizon)))?;

    if cli.json {
        println!("{}", report::render_json(&analysis).context("failed to serialize report")?);
    } else {
        print!("{}", report::render_report(&analysis));
    }

    if config.render_charts {
        let paths = charts::render_charts(&analysis, &config.chart_dir)?;
        if !cli.json {
            println!("Charts written to {} ({} files)", config.chart_dir.display(), paths.len());
        }
    }

    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trade_advisor=info,polygon_client=warn".into());

    // stderr keeps logs out of the report on stdout
    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}
