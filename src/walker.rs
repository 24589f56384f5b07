//! Pagination walker
//!
//! For one account and one watermark, retrieves every trade newer than the
//! watermark across as many pages as needed, and reports the newest
//! timestamp seen (the new watermark candidate).
//!
//! Precondition on the feed: trades arrive newest-first within a page and
//! across pages. The walker's short-circuit (one request when the first
//! record is at or below the watermark) and per-page boundary stop depend on
//! it. If the feed ever returns pages out of order the result is undefined;
//! this is a documented limitation of the feed contract, not something the
//! walker tries to detect or repair.

use std::time::Duration;

use crate::error::FeedError;
use crate::feed::{TradeFeed, TradeRecord};

/// Result of walking one account.
///
/// `newest_ts` equals the watermark passed in when nothing new was found,
/// so the caller can always set the checkpoint to `newest_ts`.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub newest_ts: i64,
    pub trades: Vec<TradeRecord>,
}

impl WalkOutcome {
    fn unchanged(watermark: i64) -> Self {
        Self {
            newest_ts: watermark,
            trades: Vec::new(),
        }
    }

    pub fn has_new_trades(&self) -> bool {
        !self.trades.is_empty()
    }
}

/// Retrieve all trades newer than `watermark` for `account_id`.
///
/// A failure on the first page is the caller's problem (the account is
/// skipped, checkpoint untouched). A failure on a continuation page only
/// terminates pagination: the delta accumulated from pages already fetched
/// is kept and `newest_ts` still advances, forfeiting the unfetched tail.
///
/// `page_delay` is slept between page requests as cooperative rate limiting
/// against the feed; it plays no role in correctness.
pub async fn walk(
    feed: &dyn TradeFeed,
    account_id: &str,
    watermark: i64,
    page_delay: Duration,
) -> Result<WalkOutcome, FeedError> {
    let first = feed.fetch_page(account_id, None).await?;

    if first.data.is_empty() {
        return Ok(WalkOutcome::unchanged(watermark));
    }

    let newest_ts = first.data[0].ts_ms;
    if newest_ts <= watermark {
        // No new trades; this single request is all the account costs.
        log::debug!(
            "account {}: newest trade {} at or below watermark {}",
            account_id,
            newest_ts,
            watermark
        );
        return Ok(WalkOutcome::unchanged(watermark));
    }

    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut page = first;

    loop {
        // Newest-first: everything before the boundary is new, and the
        // boundary is reached at most once per page.
        for record in &page.data {
            if record.ts_ms <= watermark {
                break;
            }
            trades.push(record.clone());
        }

        let oldest_ts = match page.data.last() {
            Some(last) => last.ts_ms,
            None => break,
        };

        // Continue only while a cursor exists and even the oldest record
        // fetched so far is still above the watermark.
        let cursor = match page.meta.next_cursor.take() {
            Some(cursor) if oldest_ts > watermark => cursor,
            _ => break,
        };

        tokio::time::sleep(page_delay).await;

        page = match feed.fetch_page(account_id, Some(&cursor)).await {
            Ok(next) => next,
            Err(e) => {
                log::warn!(
                    "account {}: continuation page failed, keeping {} trades already fetched: {}",
                    account_id,
                    trades.len(),
                    e
                );
                break;
            }
        };

        if page.data.is_empty() {
            break;
        }
    }

    Ok(WalkOutcome { newest_ts, trades })
}
