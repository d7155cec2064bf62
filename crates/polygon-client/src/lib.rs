use analysis_core::{AnalysisError, Financials, FundamentalRatios, MarketDataSource, PriceBar};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://api.polygon.io";

/// Dividends with an ex-date this many days back count towards the yield.
const DIVIDEND_LOOKBACK_DAYS: i64 = 365;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }
            let oldest = ts.front().copied().unwrap_or(now);

            // Wait until the oldest request falls out of the window
            let sleep_dur = (oldest + self.window).duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    /// `rate_limit` is requests per minute; the free tier allows 5.
    pub fn new(api_key: String, rate_limit: usize, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        })
    }

    /// Send a rate-limited request. Failures are reported once, never retried.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        self.rate_limiter.acquire().await;
        builder
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))
    }

    /// Daily bars between `from` and `to` inclusive, oldest first
    pub async fn get_daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceBar>, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            BASE_URL,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ]))
            .await?;

        let agg_response: AggregateResponse = ensure_success(response).await?
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(bars_from_aggregates(agg_response.results))
    }

    /// Previous trading day's bar, if the provider has one
    pub async fn get_previous_close(&self, symbol: &str) -> Result<Option<PriceBar>, AnalysisError> {
        let url = format!("{}/v2/aggs/ticker/{}/prev", BASE_URL, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[("apiKey", self.api_key.as_str()), ("adjusted", "true")]))
            .await?;

        let agg_response: AggregateResponse = ensure_success(response).await?
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(bars_from_aggregates(agg_response.results).pop())
    }

    /// Company financials, newest filing first. `timeframe` is `annual` or `quarterly`.
    pub async fn get_financials(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> Result<Vec<Financials>, AnalysisError> {
        let url = format!("{}/vX/reference/financials", BASE_URL);
        let limit = limit.to_string();

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("timeframe", timeframe),
                ("apiKey", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("order", "desc"),
            ]))
            .await?;

        if is_plan_restricted(response.status()) {
            tracing::warn!("Financials for {} unavailable on this plan ({})", symbol, response.status());
            return Ok(Vec::new());
        }

        let fin_response: FinancialsResponse = ensure_success(response).await?
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(fin_response
            .results
            .into_iter()
            .map(|r| financials_from_result(symbol, r))
            .collect())
    }

    /// Dividend history for a symbol, newest first
    pub async fn get_dividends(&self, symbol: &str, limit: u32) -> Result<Vec<DividendInfo>, AnalysisError> {
        let url = format!("{}/v3/reference/dividends", BASE_URL);
        let limit = limit.to_string();

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("apiKey", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("order", "desc"),
            ]))
            .await?;

        if is_plan_restricted(response.status()) {
            tracing::warn!("Dividends for {} unavailable on this plan ({})", symbol, response.status());
            return Ok(Vec::new());
        }

        let div_response: DividendResponse = ensure_success(response).await?
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(div_response.results)
    }
}

#[async_trait]
impl MarketDataSource for PolygonClient {
    async fn daily_bars(&self, symbol: &str, lookback_days: i64) -> Result<Vec<PriceBar>, AnalysisError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(lookback_days);
        self.get_daily_bars(symbol, from, to).await
    }

    async fn fundamental_ratios(&self, symbol: &str) -> Result<FundamentalRatios, AnalysisError> {
        let price = self.get_previous_close(symbol).await?.map(|bar| bar.close);
        let annual = self.get_financials(symbol, "annual", 1).await?;
        let dividends = self.get_dividends(symbol, 20).await?;

        if price.is_none() {
            tracing::warn!("No previous close for {}, price-based ratios unavailable", symbol);
        }

        Ok(derive_ratios(price, annual.first(), &dividends, Utc::now().date_naive()))
    }

    async fn annual_eps(&self, symbol: &str) -> Result<Vec<f64>, AnalysisError> {
        let mut annual = self.get_financials(symbol, "annual", 5).await?;
        annual.sort_by_key(|f| f.fiscal_year);
        Ok(annual.into_iter().filter_map(|f| f.eps).collect())
    }
}

/// Derive the scorer's ratios from raw provider figures.
///
/// D/E uses the percent convention (100 = debt equals equity) and takes
/// long-term debt, or total liabilities when the filing reports no debt
/// line. ROE and dividend yield are fractions. Non-positive equity leaves D/E and ROE
/// absent, as does a zero EPS for P/E.
pub fn derive_ratios(
    price: Option<f64>,
    latest: Option<&Financials>,
    dividends: &[DividendInfo],
    as_of: NaiveDate,
) -> FundamentalRatios {
    let price = price.filter(|p| p.is_finite() && *p > 0.0);
    let equity = latest
        .and_then(|f| f.shareholders_equity)
        .filter(|e| *e > 0.0);

    let pe_ratio = match (price, latest.and_then(|f| f.eps)) {
        (Some(p), Some(eps)) if eps != 0.0 => Some(p / eps),
        _ => None,
    };

    let debt = latest.and_then(|f| f.long_term_debt.or(f.total_liabilities));
    let debt_to_equity = match (debt, equity) {
        (Some(debt), Some(equity)) => Some(debt / equity * 100.0),
        _ => None,
    };

    let return_on_equity = match (latest.and_then(|f| f.net_income), equity) {
        (Some(income), Some(equity)) => Some(income / equity),
        _ => None,
    };

    let cutoff = as_of - ChronoDuration::days(DIVIDEND_LOOKBACK_DAYS);
    let trailing: Vec<f64> = dividends
        .iter()
        .filter(|d| d.ex_date().is_some_and(|date| date > cutoff && date <= as_of))
        .filter_map(|d| d.cash_amount)
        .collect();

    let dividend_yield = match price {
        Some(p) if !trailing.is_empty() => Some(trailing.iter().sum::<f64>() / p),
        _ => None,
    };

    FundamentalRatios {
        pe_ratio,
        dividend_yield,
        debt_to_equity,
        return_on_equity,
    }
}

fn is_plan_restricted(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AnalysisError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(AnalysisError::ApiError(format!(
        "HTTP {}: {}",
        response.status(),
        response.text().await.unwrap_or_default()
    )))
}

fn bars_from_aggregates(results: Vec<AggregateResult>) -> Vec<PriceBar> {
    results
        .into_iter()
        .filter_map(|r| {
            let Some(timestamp) = DateTime::from_timestamp_millis(r.t) else {
                tracing::warn!("Skipping bar with invalid timestamp {}", r.t);
                return None;
            };
            Some(PriceBar {
                date: timestamp.date_naive(),
                open: r.o,
                high: r.h,
                low: r.l,
                close: r.c,
                volume: r.v,
            })
        })
        .collect()
}

fn financials_from_result(symbol: &str, r: FinancialResult) -> Financials {
    let income = &r.financials.income_statement;
    let balance = &r.financials.balance_sheet;

    Financials {
        symbol: symbol.to_string(),
        fiscal_year: r.fiscal_year.and_then(|y| y.parse().ok()).unwrap_or(0),
        eps: statement_value(income, "diluted_earnings_per_share")
            .or_else(|| statement_value(income, "basic_earnings_per_share")),
        net_income: statement_value(income, "net_income_loss"),
        long_term_debt: statement_value(balance, "long_term_debt"),
        total_liabilities: statement_value(balance, "liabilities"),
        shareholders_equity: statement_value(balance, "equity"),
    }
}

fn statement_value(statement: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
    statement
        .get(key)
        .and_then(|v| v.get("value"))
        .and_then(|v| v.as_f64())
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp (ms)
    o: f64, // open
    h: f64, // high
    l: f64, // low
    c: f64, // close
    v: f64, // volume
}

#[derive(Debug, Deserialize)]
struct FinancialsResponse {
    #[serde(default)]
    results: Vec<FinancialResult>,
}

#[derive(Debug, Deserialize)]
struct FinancialResult {
    fiscal_year: Option<String>,
    financials: FinancialStatements,
}

#[derive(Debug, Deserialize)]
struct FinancialStatements {
    #[serde(default)]
    income_statement: HashMap<String, serde_json::Value>,
    #[serde(default)]
    balance_sheet: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DividendResponse {
    #[serde(default)]
    results: Vec<DividendInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendInfo {
    pub cash_amount: Option<f64>,
    pub ex_dividend_date: Option<String>,
    pub pay_date: Option<String>,
    pub frequency: Option<i32>,
    #[serde(default)]
    pub dividend_type: Option<String>,
}

impl DividendInfo {
    pub fn ex_date(&self) -> Option<NaiveDate> {
        self.ex_dividend_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}
