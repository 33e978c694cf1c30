use std::time::Duration;

use tracing::info;

use crate::config::{Config, FEED_TIMEOUT_SECS};
use crate::error::{AppError, Result};

pub fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
        .build()?)
}

/// Fetch the raw most-called token records for the configured timeframe.
/// One GET, no paging — the feed returns the full ranked window in one array.
pub async fn fetch_tokens(
    client: &reqwest::Client,
    cfg: &Config,
) -> Result<Vec<serde_json::Value>> {
    let url = format!("{}?timeframe={}", cfg.feed_url, cfg.timeframe);

    let resp = client.get(&url).send().await?.error_for_status()?;
    let text = resp.text().await?;
    let items = parse_feed_body(&text)?;

    info!("Feed returned {} tokens (timeframe={})", items.len(), cfg.timeframe);
    Ok(items)
}

/// Parse the feed body: a non-JSON payload is a `Json` error, valid JSON that
/// is not an array is a `Schema` error.
fn parse_feed_body(text: &str) -> Result<Vec<serde_json::Value>> {
    let body: serde_json::Value = serde_json::from_str(text)?;
    body.as_array()
        .cloned()
        .ok_or_else(|| AppError::Schema("feed response was not an array".to_string()))
}
