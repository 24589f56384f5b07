//! Tracker Runtime
//!
//! One tracking run over the registry: fetch the account list, walk each
//! account's trade feed down to its stored watermark, and persist the
//! cumulative checkpoint document and today's daily snapshot. Scheduling is
//! external (cron or a systemd timer invokes this binary).
//!
//! Usage:
//!   cargo run --release --bin tracker_runtime
//!
//! Environment variables (see `Config::from_env`):
//!   VOLFLOW_REGISTRY_URL, VOLFLOW_FEED_URL, VOLFLOW_PAGE_SIZE,
//!   VOLFLOW_STATE_PATH, VOLFLOW_DAILY_DIR, VOLFLOW_PERSIST_EVERY,
//!   VOLFLOW_REQUEST_DELAY_MS, VOLFLOW_HTTP_TIMEOUT_SECS, RUST_LOG

use dotenv::dotenv;
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

use volflow::checkpoint::CheckpointStore;
use volflow::config::Config;
use volflow::engine::TrackerEngine;
use volflow::feed::HttpTradeFeed;
use volflow::registry;
use volflow::snapshot::DailySnapshotTracker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_env();

    info!("🚀 Starting volflow tracker");
    info!("   ├─ Registry: {}", config.registry_url);
    info!("   ├─ Feed: {}", config.feed_url);
    info!("   ├─ Page size: {}", config.page_size);
    info!("   ├─ State: {}", config.state_path);
    info!("   ├─ Daily dir: {}", config.daily_dir);
    info!("   └─ Persist cadence: every {} accounts", config.persist_every);

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    // Fatal: without the registry there is nothing to process, and nothing
    // has been persisted yet.
    let entries = match registry::fetch_registry(&client, &config.registry_url).await {
        Ok(entries) => entries,
        Err(e) => {
            error!("registry fetch failed, aborting run: {}", e);
            return Err(e.into());
        }
    };
    info!("registry loaded: {} accounts", entries.len());

    let checkpoints = CheckpointStore::load_or_default(&config.state_path);
    let snapshot = DailySnapshotTracker::load_for_today(Path::new(&config.daily_dir));
    info!("daily snapshot date: {}", snapshot.date());

    let feed = Arc::new(HttpTradeFeed::new(client, &config.feed_url, config.page_size));
    let mut engine = TrackerEngine::new(
        feed,
        checkpoints,
        snapshot,
        config.persist_every,
        config.request_delay,
    );

    let summary = engine.run(&entries).await;

    info!(
        "✅ Run complete: {} accounts ({} updated, {} unchanged, {} skipped), +{:.4} volume",
        summary.processed,
        summary.updated,
        summary.no_new_trades,
        summary.skipped,
        summary.volume_added
    );

    Ok(())
}
