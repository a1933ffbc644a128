use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info, warn};

use crate::game::sort::{SortOrder, SortPolicy};

// =============================================================================
// Site constants
// =============================================================================

/// Forum the tracked threads live on
pub const DEFAULT_SITE_URL: &str = "https://f95zone.to";

/// Path segment under which threads are served
pub const THREADS_PATH_SEGMENT: &str = "threads";

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

const COLLECTION_FILE_NAME: &str = "gameInfoCollection.json";
const SETTINGS_FILE_NAME: &str = "settings.json";
const LOG_FILE_NAME: &str = "thread-tracker.log";

/// Prefix every thread URL starts with
pub fn threads_url(site_url: &str) -> String {
    format!("{}/{}", site_url.trim_end_matches('/'), THREADS_PATH_SEGMENT)
}

/// Returns the path to the data directory for thread-tracker.
/// Uses $XDG_DATA_HOME/thread-tracker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/thread-tracker,
/// or ./thread-tracker if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the collection file inside `data_dir`.
pub fn collection_path(data_dir: &Path) -> PathBuf {
    data_dir.join(COLLECTION_FILE_NAME)
}

/// Returns the path to the settings file inside `data_dir`.
pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE_NAME)
}

/// Returns the path to the log file inside `data_dir`.
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("thread-tracker")
}

/// User preferences persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    /// When the whole collection was last checked for updates
    #[serde(with = "crate::game::timestamp")]
    pub last_checked: Option<DateTime<Local>>,
    #[serde(deserialize_with = "deserialize_sort_order")]
    pub sort_order: SortOrder,
    #[serde(rename = "GivePriorityToFavoritesWhileSorting")]
    pub prioritize_favorites: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_checked: None,
            sort_order: SortOrder::Alphabetical,
            prioritize_favorites: true,
        }
    }
}

impl Settings {
    pub fn sort_policy(&self) -> SortPolicy {
        SortPolicy::new(self.sort_order, self.prioritize_favorites)
    }

    /// Loads settings, falling back to defaults when the file is missing or unreadable
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                info!("Using default settings, couldn't read {:?}: {}", path, e);
                return Self::default();
            }
        };

        serde_json::from_str(&content)
            .inspect_err(|e| warn!("Invalid settings file {:?}: {}", path, e))
            .unwrap_or_default()
    }

    /// Saves settings; returns false when the file could not be written
    pub fn save(&self, path: &Path) -> bool {
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| {
                let json = serde_json::to_string_pretty(self)?;
                fs::write(path, json)
            });

        result
            .inspect_err(|e| error!("Failed to save settings to {:?}: {}", path, e))
            .is_ok()
    }
}

/// Older settings files store the sort order as its numeric index
fn deserialize_sort_order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SortOrder, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSortOrder {
        Index(u8),
        Name(SortOrder),
    }

    match RawSortOrder::deserialize(deserializer)? {
        RawSortOrder::Name(order) => Ok(order),
        RawSortOrder::Index(index) => SortOrder::from_index(index)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown sort order index {}", index))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn settings_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<Settings>(json!({
            "SortOrder": "UnfinishedFirst"
        }))
        .unwrap();

        assert_eq!(
            result,
            Settings {
                sort_order: SortOrder::UnfinishedFirst,
                ..Settings::default()
            }
        );
    }

    #[rstest]
    #[case(0, SortOrder::Alphabetical)]
    #[case(1, SortOrder::NotUpdatedFirst)]
    #[case(2, SortOrder::WithoutCurrentVersionFirst)]
    #[case(3, SortOrder::UnfinishedFirst)]
    fn settings_reads_numeric_sort_order(#[case] index: u8, #[case] expected: SortOrder) {
        let result = serde_json::from_value::<Settings>(json!({
            "LastChecked": "2021-05-04T18:30:00.5",
            "IsListsCollapsed": false,
            "SortOrder": index,
            "GivePriorityToFavoritesWhileSorting": false,
            "IsDarkThemeEnabled": true
        }))
        .unwrap();

        assert_eq!(result.sort_order, expected);
        assert!(!result.prioritize_favorites);
        assert!(result.last_checked.is_some());
    }

    #[test]
    fn settings_rejects_unknown_sort_order_index() {
        let result = serde_json::from_value::<Settings>(json!({ "SortOrder": 9 }));

        assert!(result.is_err());
    }

    #[test]
    fn settings_save_then_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        let settings = Settings {
            last_checked: None,
            sort_order: SortOrder::NotUpdatedFirst,
            prioritize_favorites: false,
        };

        assert!(settings.save(&path));

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn settings_load_falls_back_to_defaults_for_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn threads_url_joins_site_and_segment() {
        assert_eq!(threads_url("https://f95zone.to/"), "https://f95zone.to/threads");
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/thread-tracker"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/thread-tracker"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./thread-tracker"));
    }
}
