//! Bounded, URL-deduplicated history of visited pages.

use indexmap::IndexMap;
use serde_json::Value;
use sm_core::{KeyValueStore, PageRecord, Result, BATCH_SIZE, NAVIGATION_DATA_KEY};
use std::sync::Arc;
use tracing::{debug, error};

/// Where an overwritten record sits afterwards, which decides what gets trimmed first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverwritePosition {
    /// Keep the slot of the first insertion. Only new URLs move to the end.
    #[default]
    Keep,
    /// Treat an overwrite as a fresh insertion at the end.
    MoveToEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    pub batch_size: usize,
    pub overwrite_position: OverwritePosition,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            overwrite_position: OverwritePosition::default(),
        }
    }
}

/// Latest-wins merge of `incoming` over `existing`, trimmed to the trailing
/// `config.batch_size` records.
///
/// A later record always replaces an earlier one with the same URL, whatever their
/// capture dates say.
pub fn merge_records(
    existing: Vec<PageRecord>,
    incoming: &[PageRecord],
    config: &HistoryConfig,
) -> Vec<PageRecord> {
    let mut by_url: IndexMap<String, PageRecord> =
        IndexMap::with_capacity(existing.len() + incoming.len());

    for record in existing {
        by_url.insert(record.url.clone(), record);
    }

    for record in incoming {
        if config.overwrite_position == OverwritePosition::MoveToEnd {
            by_url.shift_remove(&record.url);
        }
        by_url.insert(record.url.clone(), record.clone());
    }

    let mut merged: Vec<PageRecord> = by_url.into_values().collect();
    if merged.len() > config.batch_size {
        let excess = merged.len() - config.batch_size;
        merged.drain(..excess);
    }
    merged
}

/// The persisted `navigationData` list.
///
/// Every merge reads the current list right before writing the new one. There is
/// no lock across that read and write, so two merges racing on the same backend
/// can lose one of the updates: whichever persists last wins.
#[derive(Clone)]
pub struct LocalHistoryStore {
    store: Arc<dyn KeyValueStore>,
    config: HistoryConfig,
}

impl LocalHistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, HistoryConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// The stored records, oldest insertion first. Empty when nothing was stored yet.
    ///
    /// A stored value that is not a list of records is an `Error::Storage`: one
    /// unreadable entry fails the whole read, so a later merge never writes back a
    /// list with that entry silently missing.
    pub async fn records(&self) -> Result<Vec<PageRecord>> {
        let Some(value) = self.store.get(NAVIGATION_DATA_KEY).await? else {
            return Ok(Vec::new());
        };

        let Value::Array(items) = value else {
            return Err(sm_core::Error::Storage(format!(
                "{} is not a list",
                NAVIGATION_DATA_KEY
            )));
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| {
                    sm_core::Error::Storage(format!(
                        "{} entry {} is unreadable: {}",
                        NAVIGATION_DATA_KEY, index, e
                    ))
                })
            })
            .collect()
    }

    /// Merge and persist, reporting failures to the caller.
    pub async fn try_merge(&self, incoming: &[PageRecord]) -> Result<Vec<PageRecord>> {
        let existing = self.records().await?;
        let merged = merge_records(existing, incoming, &self.config);
        self.store
            .set(NAVIGATION_DATA_KEY, serde_json::to_value(&merged)?)
            .await?;
        debug!(
            "💾 Merged {} records, history now holds {}",
            incoming.len(),
            merged.len()
        );
        Ok(merged)
    }

    /// Merge and persist. Storage failures are logged and swallowed so the capture
    /// pipeline keeps going; `None` means nothing was written.
    pub async fn merge(&self, incoming: &[PageRecord]) -> Option<Vec<PageRecord>> {
        match self.try_merge(incoming).await {
            Ok(merged) => Some(merged),
            Err(e) => {
                error!("Error saving data locally: {}", e);
                None
            }
        }
    }

    /// Reset the history to an empty list.
    pub async fn clear(&self) -> Result<()> {
        self.store
            .set(NAVIGATION_DATA_KEY, Value::Array(Vec::new()))
            .await
    }
}
