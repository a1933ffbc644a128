//! Ordered, name-unique set of tracked games

use indexmap::IndexMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::game::error::DuplicateError;
use crate::game::record::GameRecord;
use crate::game::sort::SortPolicy;

/// Mutation notifications for display layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    Added { id: String },
    Removed { id: String },
    Updated { id: String },
    Reordered,
    /// A bulk refresh is about to fetch game `position` of `total`, counted from 1
    Checking {
        id: String,
        position: usize,
        total: usize,
    },
}

/// Tracked games keyed by thread id, kept in display order.
///
/// Names are unique across the collection. Any mutation that should be
/// persisted sets the dirty flag until [`Collection::mark_clean`] is called.
#[derive(Debug, Default)]
pub struct Collection {
    records: IndexMap<String, GameRecord>,
    dirty: bool,
    events: Option<UnboundedSender<CollectionEvent>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a clean collection from loaded records, skipping duplicates
    pub fn from_records(records: Vec<GameRecord>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if let Err(e) = collection.insert(record) {
                warn!("Skipping loaded record: {}", e);
            }
        }
        collection
    }

    /// Sends every subsequent mutation to `events`
    pub fn with_events(mut self, events: UnboundedSender<CollectionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRecord> {
        self.records.values()
    }

    /// Thread ids in current display order
    pub fn ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut GameRecord> {
        self.records.get_mut(id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.records.values().any(|record| record.name() == name)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Clones the records in display order, e.g. for saving
    pub fn to_records(&self) -> Vec<GameRecord> {
        self.records.values().cloned().collect()
    }

    /// Appends a record unless an equal one is already tracked
    pub fn add(&mut self, record: GameRecord) -> Result<(), DuplicateError> {
        let id = record.id().to_string();
        self.insert(record)?;
        debug!("Added {} to collection", id);
        self.dirty = true;
        self.emit(CollectionEvent::Added { id });
        Ok(())
    }

    fn insert(&mut self, record: GameRecord) -> Result<(), DuplicateError> {
        // Same thread under a different name would otherwise replace the stored record
        if self.records.contains_key(record.id()) || self.records.values().any(|r| *r == record) {
            return Err(DuplicateError {
                name: record.name().to_string(),
            });
        }

        self.records.insert(record.id().to_string(), record);
        Ok(())
    }

    /// Removes the record with `id`, returning it when present
    pub fn remove(&mut self, id: &str) -> Option<GameRecord> {
        let removed = self.records.shift_remove(id)?;
        debug!("Removed {} from collection", id);
        self.dirty = true;
        self.emit(CollectionEvent::Removed { id: id.to_string() });
        Some(removed)
    }

    /// Adopts the latest version as owned; returns whether anything changed
    pub fn sync_version(&mut self, id: &str) -> bool {
        self.modify(id, GameRecord::sync_version)
    }

    pub fn set_current_version(&mut self, id: &str, version: &str) -> bool {
        self.modify(id, |record| record.set_current_version(version))
    }

    pub fn set_group(&mut self, id: &str, group: &str) -> bool {
        self.modify(id, |record| record.set_group(group))
    }

    pub fn set_favorite(&mut self, id: &str, favorite: bool) -> bool {
        self.modify(id, |record| record.set_favorite(favorite))
    }

    pub fn set_version_finished(&mut self, id: &str, finished: bool) -> bool {
        self.modify(id, |record| record.set_version_finished(finished))
    }

    fn modify(&mut self, id: &str, change: impl FnOnce(&mut GameRecord) -> bool) -> bool {
        let changed = self.records.get_mut(id).is_some_and(change);
        if changed {
            self.mark_updated(id);
        }
        changed
    }

    /// Records an out-of-band change to the record with `id`
    pub(crate) fn mark_updated(&mut self, id: &str) {
        self.dirty = true;
        self.emit(CollectionEvent::Updated { id: id.to_string() });
    }

    /// Announces the game a bulk refresh is about to check
    pub(crate) fn report_checking(&self, id: &str, position: usize, total: usize) {
        self.emit(CollectionEvent::Checking {
            id: id.to_string(),
            position,
            total,
        });
    }

    /// Reorders the records; membership and the dirty flag are unaffected
    pub fn sort(&mut self, policy: &SortPolicy) {
        self.records.sort_by(|_, a, _, b| policy.compare(a, b));
        self.emit(CollectionEvent::Reordered);
    }

    /// Records whose name contains `query`, ignoring case.
    ///
    /// Blank queries and queries containing `site_url` match everything, since
    /// the same input doubles as the "add by URL" field.
    pub fn filter<'a>(
        &'a self,
        query: &'a str,
        site_url: &'a str,
    ) -> impl Iterator<Item = &'a GameRecord> + 'a {
        let query = query.trim().to_lowercase();
        let bypass = query.is_empty() || query.contains(&site_url.to_lowercase());
        self.records
            .values()
            .filter(move |record| bypass || record.name().to_lowercase().contains(&query))
    }

    /// Distinct groups in order of first appearance
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for record in self.records.values() {
            if !groups.contains(&record.group()) {
                groups.push(record.group());
            }
        }
        groups
    }

    fn emit(&self, event: CollectionEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Collection event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::sort::SortOrder;
    use crate::thread::url::ThreadRef;
    use tokio::sync::mpsc::unbounded_channel;

    fn record(id: u32, name: &str) -> GameRecord {
        let url = format!("https://f95zone.to/threads/game.{}/", id);
        GameRecord::new(ThreadRef::parse(&url).unwrap()).with_name(name)
    }

    #[test]
    fn add_appends_and_marks_dirty() {
        let mut collection = Collection::new();

        collection.add(record(1, "First")).unwrap();
        collection.add(record(2, "Second")).unwrap();

        assert_eq!(collection.ids(), vec!["1", "2"]);
        assert!(collection.is_dirty());
    }

    #[test]
    fn add_rejects_duplicate_name_without_changing_collection() {
        let mut collection = Collection::from_records(vec![record(1, "Same")]);

        let result = collection.add(record(2, "Same"));

        assert_eq!(
            result,
            Err(DuplicateError {
                name: "Same".to_string()
            })
        );
        assert_eq!(collection.len(), 1);
        assert!(!collection.is_dirty());
    }

    #[test]
    fn add_rejects_same_thread_under_other_name() {
        let mut collection = Collection::from_records(vec![record(1, "Old name")]);

        assert!(collection.add(record(1, "New name")).is_err());
        assert_eq!(collection.get("1").unwrap().name(), "Old name");
    }

    #[test]
    fn from_records_skips_duplicates_and_stays_clean() {
        let collection =
            Collection::from_records(vec![record(1, "A"), record(2, "A"), record(3, "B")]);

        assert_eq!(collection.ids(), vec!["1", "3"]);
        assert!(!collection.is_dirty());
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut collection = Collection::from_records(vec![record(1, "A")]);

        assert!(collection.remove("99").is_none());
        assert!(!collection.is_dirty());

        let removed = collection.remove("1").unwrap();
        assert_eq!(removed.name(), "A");
        assert!(collection.is_empty());
        assert!(collection.is_dirty());
    }

    #[test]
    fn sync_version_returns_true_then_false() {
        let mut game = record(1, "A");
        game.set_latest_version("v1.1");
        let mut collection = Collection::from_records(vec![game]);

        assert!(collection.sync_version("1"));
        assert!(!collection.sync_version("1"));
        assert_eq!(collection.get("1").unwrap().current_version(), "v1.1");
        assert!(!collection.sync_version("missing"));
    }

    #[test]
    fn flag_setters_mark_dirty_only_on_change() {
        let mut collection = Collection::from_records(vec![record(1, "A")]);

        assert!(!collection.set_favorite("1", false));
        assert!(!collection.is_dirty());

        assert!(collection.set_favorite("1", true));
        assert!(collection.is_dirty());
    }

    #[test]
    fn sort_keeps_membership_and_dirty_flag() {
        let mut collection =
            Collection::from_records(vec![record(1, "c"), record(2, "a"), record(3, "b")]);

        collection.sort(&SortPolicy::new(SortOrder::Alphabetical, false));

        assert_eq!(collection.ids(), vec!["2", "3", "1"]);
        assert!(!collection.is_dirty());
    }

    #[test]
    fn filter_matches_name_case_insensitively() {
        let collection = Collection::from_records(vec![
            record(1, "City of Broken Dreamers"),
            record(2, "Summer Days"),
        ]);

        let names: Vec<_> = collection
            .filter("BROKEN", "https://f95zone.to")
            .map(|r| r.name())
            .collect();

        assert_eq!(names, vec!["City of Broken Dreamers"]);
    }

    #[test]
    fn filter_shows_everything_for_blank_or_url_input() {
        let collection =
            Collection::from_records(vec![record(1, "Alpha"), record(2, "Beta")]);

        assert_eq!(collection.filter("  ", "https://f95zone.to").count(), 2);
        assert_eq!(
            collection
                .filter(
                    "https://F95zone.to/threads/new-game.5/",
                    "https://f95zone.to"
                )
                .count(),
            2
        );
    }

    #[test]
    fn groups_lists_distinct_groups_in_order() {
        let mut first = record(1, "A");
        first.set_group("Playing");
        let second = record(2, "B");
        let mut third = record(3, "C");
        third.set_group("Playing");

        let collection = Collection::from_records(vec![first, second, third]);

        assert_eq!(collection.groups(), vec!["Playing", "No group"]);
    }

    #[test]
    fn mutations_are_sent_to_event_channel() {
        let (tx, mut rx) = unbounded_channel();
        let mut collection = Collection::new().with_events(tx);

        collection.add(record(1, "A")).unwrap();
        collection.set_group("1", "Done");
        collection.sort(&SortPolicy::default());
        collection.remove("1");

        let id = "1".to_string();
        assert_eq!(rx.try_recv().unwrap(), CollectionEvent::Added { id: id.clone() });
        assert_eq!(rx.try_recv().unwrap(), CollectionEvent::Updated { id: id.clone() });
        assert_eq!(rx.try_recv().unwrap(), CollectionEvent::Reordered);
        assert_eq!(rx.try_recv().unwrap(), CollectionEvent::Removed { id });
        assert!(rx.try_recv().is_err());
    }
}
