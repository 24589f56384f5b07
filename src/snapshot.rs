//! Daily snapshot tracker
//!
//! A secondary, date-scoped view of the cumulative store: one JSON document
//! per UTC calendar date (`daily_vol_<date>.json`), keyed by address, each
//! value `{"total_volume": .., "today_added_volume": ..}`. A new date gets a
//! fresh document; dates are never merged. Within a date the document is
//! reloaded at startup so `today_added_volume` accumulates across runs.

use {
    crate::checkpoint::replace_document,
    crate::error::TrackerError,
    chrono::{NaiveDate, Utc},
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        fs,
        path::{Path, PathBuf},
    },
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Mirror of the cumulative checkpoint at time of update.
    pub total_volume: f64,

    /// Deltas accumulated by runs on the active date only.
    pub today_added_volume: f64,
}

pub struct DailySnapshotTracker {
    path: PathBuf,
    date: NaiveDate,
    entries: HashMap<String, SnapshotEntry>,
}

impl DailySnapshotTracker {
    pub fn load_for_today(dir: &Path) -> Self {
        Self::load_for_date(dir, Utc::now().date_naive())
    }

    /// Load the document for `date`, or start fresh (absent and unparsable
    /// both mean fresh; the date may simply have no runs yet).
    pub fn load_for_date(dir: &Path, date: NaiveDate) -> Self {
        let path = dir.join(format!("daily_vol_{}.json", date));
        let entries = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!(
                        "daily snapshot {} is unparsable, starting fresh: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self { path, date, entries }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Register `address` for the active date with a zero added-volume,
    /// leaving an existing entry untouched.
    pub fn ensure_account(&mut self, address: &str, total_volume: f64) {
        self.entries
            .entry(address.to_string())
            .or_insert(SnapshotEntry {
                total_volume,
                today_added_volume: 0.0,
            });
    }

    /// Record a freshly-computed delta: the total mirrors the cumulative
    /// store, the added volume accumulates.
    pub fn apply_delta(&mut self, address: &str, delta: f64, new_total: f64) {
        let entry = self.entries.entry(address.to_string()).or_default();
        entry.total_volume = new_total;
        entry.today_added_volume += delta;
    }

    pub fn get(&self, address: &str) -> Option<&SnapshotEntry> {
        self.entries.get(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same replace discipline as the checkpoint store.
    pub fn persist(&self) -> Result<(), TrackerError> {
        let json = serde_json::to_string_pretty(&self.entries).map_err(|source| {
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
            "persisted daily snapshot ({} accounts) to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
