//! Error taxonomy for the tracker
//!
//! Only the registry fetch is fatal to a run: without the registry there is
//! nothing to process. Every other failure is local to one account or one
//! page and is handled at the point of detection (logged, then skipped).

use thiserror::Error;

/// A trade feed request that did not produce a usable page.
///
/// On the first page of an account this skips the whole account; on a
/// continuation page it terminates pagination while keeping the delta
/// accumulated from pages already fetched.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("trade feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("trade feed returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Top-level tracker errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Registry retrieval failed. Fatal: the run aborts before any account
    /// is touched and nothing is persisted.
    #[error("registry fetch failed: {0}")]
    RegistryFetch(#[source] reqwest::Error),

    #[error("registry returned status {0}")]
    RegistryStatus(reqwest::StatusCode),

    /// A state document could not be written. Not retried within the run;
    /// the previous durable document is left intact.
    #[error("failed to write state document {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state document {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
