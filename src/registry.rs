//! Account registry retrieval
//!
//! The registry is the external list defining which accounts are tracked:
//! a JSON array of `{"userId": .., "address": ..}`. Retrieval failure is
//! fatal to the run; a malformed entry only skips that entry.

use reqwest::Client;
use serde_json::Value;

use crate::error::TrackerError;

/// One tracked account: the feed identifier and the checkpoint-map key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub user_id: String,
    pub address: String,
}

/// Fetch and parse the registry.
///
/// Transport errors, non-2xx responses, and a body that is not a JSON array
/// all abort the run before any account is processed.
pub async fn fetch_registry(client: &Client, url: &str) -> Result<Vec<RegistryEntry>, TrackerError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(TrackerError::RegistryFetch)?;

    if !response.status().is_success() {
        return Err(TrackerError::RegistryStatus(response.status()));
    }

    let raw: Vec<Value> = response.json().await.map_err(TrackerError::RegistryFetch)?;
    Ok(parse_entries(raw))
}

/// Keep entries carrying both `userId` and `address`; warn on the rest.
fn parse_entries(raw: Vec<Value>) -> Vec<RegistryEntry> {
    let total = raw.len();
    let entries: Vec<RegistryEntry> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let user_id = value.get("userId").and_then(Value::as_str);
            let address = value.get("address").and_then(Value::as_str);
            match (user_id, address) {
                (Some(user_id), Some(address)) => Some(RegistryEntry {
                    user_id: user_id.to_string(),
                    address: address.to_string(),
                }),
                _ => {
                    log::warn!("registry entry {} is malformed, skipping: {}", idx, value);
                    None
                }
            }
        })
        .collect();

    if entries.len() < total {
        log::warn!(
            "registry: kept {} of {} entries ({} malformed)",
            entries.len(),
            total,
            total - entries.len()
        );
    }

    entries
}
