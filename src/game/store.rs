//! JSON persistence for the tracked collection
//!
//! Storage failures never reach the caller: loading degrades to an empty list
//! and saving reports a boolean.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::game::error::StoreError;
use crate::game::record::{DEFAULT_GROUP, EMPTY_FIELD, GameRecord};
use crate::thread::url::{ThreadRef, thread_id_from_url};

/// On-disk shape of one record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StoredRecord {
    url: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    current_version: Option<String>,
    #[serde(default)]
    latest_version: Option<String>,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    is_version_finished: bool,
    #[serde(default, with = "crate::game::timestamp")]
    last_checked: Option<DateTime<Local>>,
    #[serde(default)]
    last_checked_version: Option<String>,
}

impl From<&GameRecord> for StoredRecord {
    fn from(record: &GameRecord) -> Self {
        Self {
            url: record.url().to_string(),
            id: Some(record.id().to_string()),
            name: Some(record.name().to_string()),
            group: Some(record.group().to_string()),
            current_version: Some(record.current_version().to_string()),
            latest_version: Some(record.latest_version().to_string()),
            is_favorite: record.is_favorite(),
            is_version_finished: record.is_version_finished(),
            last_checked: record.last_checked(),
            last_checked_version: Some(record.last_checked_version().to_string()),
        }
    }
}

impl StoredRecord {
    /// Converts to a record, keeping the stored id and deriving it only when absent
    fn into_record(self) -> Option<GameRecord> {
        let id = match self.id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => thread_id_from_url(&self.url)?.to_string(),
        };

        Some(GameRecord::restore(
            ThreadRef::from_parts(self.url, id),
            self.name.unwrap_or_default(),
            self.group.as_deref().unwrap_or_default(),
            self.current_version.as_deref().unwrap_or_default(),
            self.latest_version.as_deref().unwrap_or_default(),
            self.is_favorite,
            self.is_version_finished,
            self.last_checked,
            self.last_checked_version.as_deref().unwrap_or_default(),
        ))
    }
}

/// One-time migration for files written when the "no group" value shared the
/// empty-version placeholder `-`. Such groups are rewritten to [`DEFAULT_GROUP`].
///
/// Returns the number of migrated records. Files saved by this version never
/// contain the legacy value, so this can be dropped once old files are gone.
fn migrate_legacy_group(records: &mut [StoredRecord]) -> usize {
    let mut migrated = 0;
    for record in records.iter_mut() {
        if record.group.as_deref() == Some(EMPTY_FIELD) {
            record.group = Some(DEFAULT_GROUP.to_string());
            migrated += 1;
        }
    }
    migrated
}

/// File-backed store for the tracked collection
pub struct CollectionStore {
    path: PathBuf,
}

impl CollectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all records, returning an empty list on any failure
    pub fn load(&self) -> Vec<GameRecord> {
        if !self.path.exists() {
            info!("No collection file at {:?}, starting empty", self.path);
            return Vec::new();
        }

        match self.try_load() {
            Ok(records) => {
                info!("Loaded {} records from {:?}", records.len(), self.path);
                records
            }
            Err(e) => {
                error!("Failed to load collection from {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<GameRecord>, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        let mut stored: Vec<StoredRecord> = serde_json::from_str(&content)?;

        let migrated = migrate_legacy_group(&mut stored);
        if migrated > 0 {
            info!("Migrated legacy group of {} records", migrated);
        }

        let records = stored
            .into_iter()
            .filter_map(|record| {
                let url = record.url.clone();
                let restored = record.into_record();
                if restored.is_none() {
                    warn!("Skipping stored record with invalid url: {}", url);
                }
                restored
            })
            .collect();

        Ok(records)
    }

    /// Saves all records; returns false when the file could not be written
    pub fn save(&self, records: &[GameRecord]) -> bool {
        match self.try_save(records) {
            Ok(()) => {
                info!("Saved {} records to {:?}", records.len(), self.path);
                true
            }
            Err(e) => {
                error!("Failed to save collection to {:?}: {}", self.path, e);
                false
            }
        }
    }

    fn try_save(&self, records: &[GameRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let stored: Vec<StoredRecord> = records.iter().map(StoredRecord::from).collect();
        let json = serde_json::to_string_pretty(&stored)?;

        // Write to a sibling file first so a failed write never truncates the collection
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Collection written to {:?}", self.path);
        Ok(())
    }
}
