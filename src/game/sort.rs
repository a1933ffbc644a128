//! Display ordering for tracked games

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::record::GameRecord;

/// Selectable display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Name ascending
    #[default]
    Alphabetical,
    /// Games whose owned version lags behind the source first
    NotUpdatedFirst,
    /// Games without an owned version first
    WithoutCurrentVersionFirst,
    /// Games whose owned version is not finished yet first
    UnfinishedFirst,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Alphabetical,
        SortOrder::NotUpdatedFirst,
        SortOrder::UnfinishedFirst,
        SortOrder::WithoutCurrentVersionFirst,
    ];

    /// Maps the numeric value used by older settings files
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(SortOrder::Alphabetical),
            1 => Some(SortOrder::NotUpdatedFirst),
            2 => Some(SortOrder::WithoutCurrentVersionFirst),
            3 => Some(SortOrder::UnfinishedFirst),
            _ => None,
        }
    }

    /// Returns the command-line spelling of the order
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Alphabetical => "alphabetical",
            SortOrder::NotUpdatedFirst => "not-updated-first",
            SortOrder::WithoutCurrentVersionFirst => "without-current-version-first",
            SortOrder::UnfinishedFirst => "unfinished-first",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = SortOrder::ALL.iter().map(SortOrder::as_str).collect();
                format!("unknown sort order '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// A single tie-break key in a comparator chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    /// Favorites first
    Favorite,
    /// Mismatched versions first
    VersionsMatch,
    /// Missing owned version first when ascending
    HasCurrentVersion { descending: bool },
    /// Unfinished first
    VersionFinished,
    Name,
}

impl SortKey {
    fn compare(self, a: &GameRecord, b: &GameRecord) -> Ordering {
        match self {
            SortKey::Favorite => b.is_favorite().cmp(&a.is_favorite()),
            SortKey::VersionsMatch => a.versions_match().cmp(&b.versions_match()),
            SortKey::HasCurrentVersion { descending: false } => {
                a.has_current_version().cmp(&b.has_current_version())
            }
            SortKey::HasCurrentVersion { descending: true } => {
                b.has_current_version().cmp(&a.has_current_version())
            }
            SortKey::VersionFinished => a.is_version_finished().cmp(&b.is_version_finished()),
            SortKey::Name => compare_names(a.name(), b.name()),
        }
    }
}

/// Case-insensitive order, falling back to ordinal so distinct names never tie
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Comparator built from a [`SortOrder`] and the favorites priority flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPolicy {
    pub order: SortOrder,
    pub prioritize_favorites: bool,
}

impl Default for SortPolicy {
    fn default() -> Self {
        Self {
            order: SortOrder::Alphabetical,
            prioritize_favorites: true,
        }
    }
}

impl SortPolicy {
    pub fn new(order: SortOrder, prioritize_favorites: bool) -> Self {
        Self {
            order,
            prioritize_favorites,
        }
    }

    fn keys(&self) -> Vec<SortKey> {
        let favorite = self.prioritize_favorites.then_some(SortKey::Favorite);
        let keys = match self.order {
            SortOrder::Alphabetical => vec![favorite, Some(SortKey::Name)],
            SortOrder::NotUpdatedFirst => vec![
                Some(SortKey::VersionsMatch),
                favorite,
                Some(SortKey::HasCurrentVersion { descending: true }),
                Some(SortKey::Name),
            ],
            SortOrder::WithoutCurrentVersionFirst => vec![
                Some(SortKey::HasCurrentVersion { descending: false }),
                favorite,
                Some(SortKey::Name),
            ],
            SortOrder::UnfinishedFirst => vec![
                Some(SortKey::VersionFinished),
                favorite,
                Some(SortKey::HasCurrentVersion { descending: true }),
                Some(SortKey::Name),
            ],
        };
        keys.into_iter().flatten().collect()
    }

    /// Compares two records by chaining the keys of the selected order
    pub fn compare(&self, a: &GameRecord, b: &GameRecord) -> Ordering {
        self.keys()
            .into_iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}
