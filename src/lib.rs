//! volflow: incremental notional-volume tracker
//!
//! Polls a registry of trading accounts, walks each account's paginated
//! trade feed down to a stored watermark, and maintains a running notional
//! volume total per account in a checkpointed JSON document plus a per-UTC-
//! date daily snapshot. Re-runs are incremental: only trades newer than the
//! watermark are counted, and a crash loses at most one persistence
//! cadence of progress.
//!
//! ## Module Organization
//!
//! - `config` - Environment-variable configuration
//! - `registry` - Tracked-account list retrieval
//! - `feed` - Trade feed wire types and HTTP client
//! - `walker` - Cursor pagination down to the watermark
//! - `aggregator` - Notional volume reduction
//! - `checkpoint` - Cumulative checkpoint store
//! - `snapshot` - Date-scoped daily snapshot tracker
//! - `engine` - Run driver orchestrating the above
//! - `error` - Error taxonomy

pub mod aggregator;
pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod registry;
pub mod snapshot;
pub mod walker;

// Re-export commonly used types
pub use checkpoint::{AccountCheckpoint, CheckpointStore};
pub use config::Config;
pub use engine::{AccountOutcome, RunSummary, TrackerEngine};
pub use error::{FeedError, TrackerError};
pub use feed::{HttpTradeFeed, PageMeta, TradeFeed, TradePage, TradeRecord};
pub use registry::{fetch_registry, RegistryEntry};
pub use snapshot::{DailySnapshotTracker, SnapshotEntry};
pub use walker::{walk, WalkOutcome};
