//! Tracked game entry

use chrono::{DateTime, Local};

use crate::thread::url::ThreadRef;

/// Group assigned to records the user has not classified
pub const DEFAULT_GROUP: &str = "No group";

/// Placeholder for version fields that hold no value
pub const EMPTY_FIELD: &str = "-";

/// One tracked game thread.
///
/// All mutations go through setters returning whether the value changed, so
/// callers can decide what to re-render or persist.
#[derive(Debug, Clone)]
pub struct GameRecord {
    thread: ThreadRef,
    name: String,
    group: String,
    current_version: String,
    latest_version: String,
    is_favorite: bool,
    is_version_finished: bool,
    last_checked: Option<DateTime<Local>>,
    last_checked_version: String,
}

impl GameRecord {
    /// Creates an empty record for `thread`; the name is filled by initialization
    pub fn new(thread: ThreadRef) -> Self {
        Self {
            thread,
            name: String::new(),
            group: DEFAULT_GROUP.to_string(),
            current_version: EMPTY_FIELD.to_string(),
            latest_version: EMPTY_FIELD.to_string(),
            is_favorite: false,
            is_version_finished: false,
            last_checked: None,
            last_checked_version: EMPTY_FIELD.to_string(),
        }
    }

    /// Builder-style name assignment, used when rebuilding records
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn thread(&self) -> &ThreadRef {
        &self.thread
    }

    pub fn id(&self) -> &str {
        self.thread.id()
    }

    pub fn url(&self) -> &str {
        self.thread.url()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn is_version_finished(&self) -> bool {
        self.is_version_finished
    }

    pub fn last_checked(&self) -> Option<DateTime<Local>> {
        self.last_checked
    }

    pub fn last_checked_version(&self) -> &str {
        &self.last_checked_version
    }

    /// True when the user has recorded a version they own
    pub fn has_current_version(&self) -> bool {
        self.current_version != EMPTY_FIELD
    }

    pub fn versions_match(&self) -> bool {
        self.current_version == self.latest_version
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        replace(&mut self.name, name.into())
    }

    /// Sets the group; blank input resets it to [`DEFAULT_GROUP`]
    pub fn set_group(&mut self, group: &str) -> bool {
        replace(&mut self.group, normalize(group, DEFAULT_GROUP))
    }

    /// Sets the owned version; blank input resets it to [`EMPTY_FIELD`]
    pub fn set_current_version(&mut self, version: &str) -> bool {
        replace(&mut self.current_version, normalize(version, EMPTY_FIELD))
    }

    /// Stores a newly observed source version, only when it differs
    pub fn set_latest_version(&mut self, version: impl Into<String>) -> bool {
        replace(&mut self.latest_version, version.into())
    }

    pub fn set_favorite(&mut self, favorite: bool) -> bool {
        replace(&mut self.is_favorite, favorite)
    }

    pub fn set_version_finished(&mut self, finished: bool) -> bool {
        replace(&mut self.is_version_finished, finished)
    }

    pub fn set_last_checked(&mut self, at: DateTime<Local>) -> bool {
        replace(&mut self.last_checked, Some(at))
    }

    pub fn set_last_checked_version(&mut self, version: impl Into<String>) -> bool {
        replace(&mut self.last_checked_version, version.into())
    }

    /// Marks the latest version as the owned one.
    ///
    /// Clears the finished flag since the new version has not been played yet.
    pub fn sync_version(&mut self) -> bool {
        if self.versions_match() {
            return false;
        }

        self.current_version = self.latest_version.clone();
        self.is_version_finished = false;
        true
    }

    /// Restores fields read back from storage, applying the same normalization as the setters
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        thread: ThreadRef,
        name: String,
        group: &str,
        current_version: &str,
        latest_version: &str,
        is_favorite: bool,
        is_version_finished: bool,
        last_checked: Option<DateTime<Local>>,
        last_checked_version: &str,
    ) -> Self {
        Self {
            thread,
            name,
            group: normalize(group, DEFAULT_GROUP),
            current_version: normalize(current_version, EMPTY_FIELD),
            latest_version: normalize(latest_version, EMPTY_FIELD),
            is_favorite,
            is_version_finished,
            last_checked,
            last_checked_version: normalize(last_checked_version, EMPTY_FIELD),
        }
    }
}

/// Records are the same entry when their names match
impl PartialEq for GameRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for GameRecord {}

fn normalize(value: &str, sentinel: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        sentinel.to_string()
    } else {
        value.to_string()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
