use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    // Data provider
    pub polygon_api_key: String,
    pub rate_limit_per_minute: usize, // 5 on the free tier
    pub request_timeout: Duration,

    // Charts
    pub chart_dir: PathBuf,
    pub render_charts: bool,
}

impl AdvisorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let polygon_api_key = lookup("POLYGON_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("POLYGON_API_KEY must be set (in the environment or a .env file)")?;

        let rate_limit_per_minute: usize = lookup("POLYGON_RATE_LIMIT")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .context("POLYGON_RATE_LIMIT must be a whole number of requests per minute")?;
        if rate_limit_per_minute == 0 {
            bail!("POLYGON_RATE_LIMIT must be at least 1");
        }

        let timeout_secs: u64 = lookup("POLYGON_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("POLYGON_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            polygon_api_key,
            rate_limit_per_minute,
            request_timeout: Duration::from_secs(timeout_secs),
            chart_dir: lookup("CHART_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("charts")),
            render_charts: lookup("RENDER_CHARTS")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .context("RENDER_CHARTS must be true or false")?,
        })
    }
}
