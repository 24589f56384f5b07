//! Run driver
//!
//! Iterates the registry in order and, per account: checkpoint lookup, walk,
//! aggregate, checkpoint + daily snapshot update. Both stores are owned by
//! the engine for the duration of the run (nothing else mutates them) and
//! are persisted every `persist_every` accounts so a crash loses at most
//! that many accounts of progress, then unconditionally at run end.
//!
//! Per-account failures never abort the run; only registry retrieval (which
//! happens before an engine exists) is fatal.

use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::notional_volume;
use crate::checkpoint::CheckpointStore;
use crate::feed::TradeFeed;
use crate::registry::RegistryEntry;
use crate::snapshot::DailySnapshotTracker;
use crate::walker;

/// What happened to one account during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountOutcome {
    /// New trades were found; the checkpoint advanced.
    Updated { delta: f64, new_watermark: i64 },

    /// The feed's newest trade is already accounted for.
    NoNewTrades,

    /// A first-page feed failure; checkpoint untouched.
    Skipped { reason: String },
}

/// Counters for one run, logged at completion.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub updated: usize,
    pub no_new_trades: usize,
    pub skipped: usize,
    pub volume_added: f64,
}

pub struct TrackerEngine {
    feed: Arc<dyn TradeFeed>,
    checkpoints: CheckpointStore,
    snapshot: DailySnapshotTracker,
    persist_every: usize,
    request_delay: Duration,
}

impl TrackerEngine {
    pub fn new(
        feed: Arc<dyn TradeFeed>,
        checkpoints: CheckpointStore,
        snapshot: DailySnapshotTracker,
        persist_every: usize,
        request_delay: Duration,
    ) -> Self {
        Self {
            feed,
            checkpoints,
            snapshot,
            persist_every,
            request_delay,
        }
    }

    /// Process every registry entry in order and persist both stores.
    pub async fn run(&mut self, entries: &[RegistryEntry]) -> RunSummary {
        let mut summary = RunSummary::default();

        for (idx, entry) in entries.iter().enumerate() {
            if idx > 0 {
                // Cooperative rate limiting between accounts.
                tokio::time::sleep(self.request_delay).await;
            }

            let outcome = self.process_account(entry).await;
            summary.processed += 1;

            match &outcome {
                AccountOutcome::Updated { delta, new_watermark } => {
                    summary.updated += 1;
                    summary.volume_added += delta;
                    log::info!(
                        "updated account {}: +{:.4} volume, watermark {}",
                        entry.user_id,
                        delta,
                        new_watermark
                    );
                }
                AccountOutcome::NoNewTrades => {
                    summary.no_new_trades += 1;
                    log::info!("skipping account {}: no new trades", entry.user_id);
                }
                AccountOutcome::Skipped { reason } => {
                    summary.skipped += 1;
                    log::warn!("skipped account {}: {}", entry.user_id, reason);
                }
            }

            if self.persist_every > 0 && (idx + 1) % self.persist_every == 0 {
                self.persist_stores();
            }
        }

        self.persist_stores();
        summary
    }

    /// One account, start to finish. Never fails the run.
    pub async fn process_account(&mut self, entry: &RegistryEntry) -> AccountOutcome {
        let checkpoint = self.checkpoints.get(&entry.address, &entry.user_id);

        let outcome = walker::walk(
            self.feed.as_ref(),
            &entry.user_id,
            checkpoint.last_ts,
            self.request_delay,
        )
        .await;

        let walk = match outcome {
            Ok(walk) => walk,
            Err(e) => {
                return AccountOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        if !walk.has_new_trades() {
            // Keep the daily document mirroring every account seen today,
            // without touching the checkpoint.
            self.snapshot.ensure_account(&entry.address, checkpoint.vol);
            return AccountOutcome::NoNewTrades;
        }

        let delta = notional_volume(&walk.trades);
        let mut updated = checkpoint;
        updated.vol += delta;
        updated.last_ts = walk.newest_ts;
        let new_total = updated.vol;

        self.checkpoints.put(&entry.address, updated);
        self.snapshot.apply_delta(&entry.address, delta, new_total);

        AccountOutcome::Updated {
            delta,
            new_watermark: walk.newest_ts,
        }
    }

    /// Persist both stores; failures are logged and not retried. The next
    /// cadence tick or the final persist rewrites the full map anyway.
    fn persist_stores(&self) {
        if let Err(e) = self.checkpoints.persist() {
            log::error!("{}", e);
        }
        if let Err(e) = self.snapshot.persist() {
            log::error!("{}", e);
        }
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn snapshot(&self) -> &DailySnapshotTracker {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::feed::{PageMeta, TradePage, TradeRecord};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::tempdir;

    struct ScriptedFeed {
        // account_id -> first page; continuation keyed by (account_id, cursor)
        pages: HashMap<(String, Option<String>), TradePage>,
        failing: Vec<String>,
    }

    impl ScriptedFeed {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                failing: Vec::new(),
            }
        }

        fn page(mut self, account_id: &str, cursor: Option<&str>, page: TradePage) -> Self {
            self.pages
                .insert((account_id.to_string(), cursor.map(String::from)), page);
            self
        }

        fn failing_account(mut self, account_id: &str) -> Self {
            self.failing.push(account_id.to_string());
            self
        }
    }

    #[async_trait]
    impl TradeFeed for ScriptedFeed {
        async fn fetch_page(
            &self,
            account_id: &str,
            cursor: Option<&str>,
        ) -> Result<TradePage, FeedError> {
            if self.failing.iter().any(|a| a == account_id) {
                return Err(FeedError::Status(
                    reqwest::StatusCode::SERVICE_UNAVAILABLE,
                ));
            }
            Ok(self
                .pages
                .get(&(account_id.to_string(), cursor.map(String::from)))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn trade(ts_ms: i64, price: f64, quantity: f64) -> TradeRecord {
        TradeRecord {
            ts_ms,
            price,
            quantity,
        }
    }

    fn one_page(trades: Vec<TradeRecord>) -> TradePage {
        TradePage {
            data: trades,
            meta: PageMeta { next_cursor: None },
        }
    }

    fn entry(user_id: &str, address: &str) -> RegistryEntry {
        RegistryEntry {
            user_id: user_id.to_string(),
            address: address.to_string(),
        }
    }

    fn engine_at(dir: &Path, feed: ScriptedFeed, persist_every: usize) -> TrackerEngine {
        let date: NaiveDate = "2024-03-01".parse().unwrap();
        TrackerEngine::new(
            Arc::new(feed),
            CheckpointStore::load_or_default(dir.join("state.json")),
            DailySnapshotTracker::load_for_date(dir, date),
            persist_every,
            Duration::from_millis(0),
        )
    }

    #[tokio::test]
    async fn test_new_trades_update_checkpoint_and_snapshot() {
        let dir = tempdir().unwrap();
        let feed = ScriptedFeed::new().page(
            "u1",
            None,
            one_page(vec![trade(300, 10.0, 2.0), trade(200, 5.0, 1.0), trade(100, 1.0, 1.0)]),
        );
        let mut engine = engine_at(dir.path(), feed, 50);

        let outcome = engine.process_account(&entry("u1", "0xaaa")).await;

        assert_eq!(
            outcome,
            AccountOutcome::Updated {
                delta: 26.0,
                new_watermark: 300
            }
        );
        let cp = engine.checkpoints().get("0xaaa", "u1");
        assert_eq!(cp.vol, 26.0);
        assert_eq!(cp.last_ts, 300);

        let snap = engine.snapshot().get("0xaaa").unwrap();
        assert_eq!(snap.total_volume, 26.0);
        assert_eq!(snap.today_added_volume, 26.0);
    }

    #[tokio::test]
    async fn test_no_new_trades_leaves_checkpoint_untouched() {
        let dir = tempdir().unwrap();
        let feed = ScriptedFeed::new()
            .page("u1", None, one_page(vec![trade(300, 10.0, 2.0)]));
        let mut engine = engine_at(dir.path(), feed, 50);

        // First pass counts the trade, second pass is a no-op
        let first = engine.process_account(&entry("u1", "0xaaa")).await;
        assert!(matches!(first, AccountOutcome::Updated { .. }));

        let second = engine.process_account(&entry("u1", "0xaaa")).await;
        assert_eq!(second, AccountOutcome::NoNewTrades);

        let cp = engine.checkpoints().get("0xaaa", "u1");
        assert_eq!(cp.vol, 20.0);
        assert_eq!(cp.last_ts, 300);
        // Snapshot still mirrors the account
        assert_eq!(engine.snapshot().get("0xaaa").unwrap().total_volume, 20.0);
    }

    #[tokio::test]
    async fn test_feed_failure_skips_account_and_run_continues() {
        let dir = tempdir().unwrap();
        let feed = ScriptedFeed::new()
            .failing_account("u1")
            .page("u2", None, one_page(vec![trade(100, 2.0, 3.0)]));
        let mut engine = engine_at(dir.path(), feed, 50);

        let summary = engine
            .run(&[entry("u1", "0xaaa"), entry("u2", "0xbbb")])
            .await;

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.volume_added, 6.0);

        // The skipped account's checkpoint stayed zero-initialized
        let cp = engine.checkpoints().get("0xaaa", "u1");
        assert_eq!(cp.vol, 0.0);
        assert_eq!(cp.last_ts, 0);
        assert!(engine.snapshot().get("0xaaa").is_none());
    }

    #[tokio::test]
    async fn test_empty_feed_account_registers_in_snapshot() {
        let dir = tempdir().unwrap();
        let feed = ScriptedFeed::new().page("u1", None, one_page(vec![]));
        let mut engine = engine_at(dir.path(), feed, 50);

        let summary = engine.run(&[entry("u1", "0xaaa")]).await;
        assert_eq!(summary.no_new_trades, 1);

        let snap = engine.snapshot().get("0xaaa").unwrap();
        assert_eq!(snap.total_volume, 0.0);
        assert_eq!(snap.today_added_volume, 0.0);
    }

    #[tokio::test]
    async fn test_run_persists_both_stores() {
        let dir = tempdir().unwrap();
        let feed = ScriptedFeed::new().page("u1", None, one_page(vec![trade(300, 10.0, 2.0)]));
        let mut engine = engine_at(dir.path(), feed, 50);

        engine.run(&[entry("u1", "0xaaa")]).await;

        assert!(dir.path().join("state.json").exists());
        assert!(dir.path().join("daily_vol_2024-03-01.json").exists());

        // Reload from disk and confirm the durable content
        let store = CheckpointStore::load_or_default(dir.path().join("state.json"));
        assert_eq!(store.get("0xaaa", "u1").vol, 20.0);
    }
}
