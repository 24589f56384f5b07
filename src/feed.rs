//! Trade feed client
//!
//! Fetches one account's trade history newest-first, one page at a time:
//!
//! Endpoint: `GET <feed-url>?account_id=<id>&limit=<pageSize>[&cursor=<cursor>]`
//! Returns: `{"data": [{"ts_ms": .., "price": .., "quantity": ..}, ..],
//!           "meta": {"next_cursor": "..."|null}}`
//!
//! The `TradeFeed` trait is the seam between the pagination walker and the
//! network; tests implement it with scripted pages.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use crate::error::FeedError;

/// One trade as returned by the feed. Transient: only its contribution to
/// the aggregate is retained.
///
/// `price` and `quantity` are lenient: a missing, null, or non-numeric field
/// deserializes to `0.0` so one defective record cannot fail a whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRecord {
    pub ts_ms: i64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
}

/// One page of the feed plus its continuation cursor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradePage {
    #[serde(default)]
    pub data: Vec<TradeRecord>,

    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Accepts a JSON number, a numeric string, or nothing; anything else is 0.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Source of trade pages for one account.
#[async_trait]
pub trait TradeFeed: Send + Sync {
    /// Fetch one page, newest-first, optionally continuing from `cursor`.
    async fn fetch_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
    ) -> Result<TradePage, FeedError>;
}

/// HTTP implementation of [`TradeFeed`] against the remote feed endpoint.
pub struct HttpTradeFeed {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl HttpTradeFeed {
    /// `client` must carry the deployment's request timeout; the feed adds
    /// no timeout of its own.
    pub fn new(client: Client, base_url: &str, page_size: usize) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            page_size,
        }
    }

    /// Build a client with a bounded timeout for standalone use.
    pub fn with_timeout(
        base_url: &str,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, base_url, page_size))
    }
}

#[async_trait]
impl TradeFeed for HttpTradeFeed {
    async fn fetch_page(
        &self,
        account_id: &str,
        cursor: Option<&str>,
    ) -> Result<TradePage, FeedError> {
        let limit = self.page_size.to_string();
        let mut query: Vec<(&str, &str)> = vec![("account_id", account_id), ("limit", &limit)];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response = self.client.get(&self.base_url).query(&query).send().await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }

        Ok(response.json().await?)
    }
}
