//! Cumulative checkpoint store
//!
//! One JSON document keyed by account address, each value
//! `{"userId": .., "vol": .., "last_ts": ..}`. For a given address both
//! fields only ever advance; the sole exception is zero-initialization when
//! no prior record exists.

use {
    crate::error::TrackerError,
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        fs, io,
        path::{Path, PathBuf},
    },
};

/// Durable progress for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCheckpoint {
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Cumulative notional volume; non-decreasing.
    pub vol: f64,

    /// Epoch-millis watermark of the newest trade accounted for;
    /// non-decreasing.
    pub last_ts: i64,
}

impl AccountCheckpoint {
    fn zero(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            vol: 0.0,
            last_ts: 0,
        }
    }
}

/// Address-keyed checkpoint map bound to its on-disk document.
pub struct CheckpointStore {
    path: PathBuf,
    state: HashMap<String, AccountCheckpoint>,
}

impl CheckpointStore {
    /// Load the document at `path`, or start empty.
    ///
    /// A missing file is a first-ever run; an unparsable document is logged
    /// and likewise treated as empty rather than aborting.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "checkpoint document {} is unparsable, starting empty: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => {
                log::info!("no checkpoint document at {}, starting empty", path.display());
                HashMap::new()
            }
        };

        if !state.is_empty() {
            log::info!("loaded {} checkpoints from {}", state.len(), path.display());
        }

        Self { path, state }
    }

    /// Checkpoint for `address`, zero-initialized when absent.
    pub fn get(&self, address: &str, user_id: &str) -> AccountCheckpoint {
        self.state
            .get(address)
            .cloned()
            .unwrap_or_else(|| AccountCheckpoint::zero(user_id))
    }

    pub fn put(&mut self, address: &str, checkpoint: AccountCheckpoint) {
        self.state.insert(address.to_string(), checkpoint);
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Write the full map, replacing the prior document.
    ///
    /// Uses write-new-then-rename so a failed persist cannot corrupt content
    /// that was already durable.
    pub fn persist(&self) -> Result<(), TrackerError> {
        let json = serde_json::to_string_pretty(&self.state).map_err(|source| {
            TrackerError::Encode {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        replace_document(&self.path, &json).map_err(|source| TrackerError::Persist {
            path: self.path.display().to_string(),
            source,
        })?;

        log::debug!(
            "persisted {} checkpoints to {}",
            self.state.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Write `contents` next to `path`, then rename over it.
pub(crate) fn replace_document(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
