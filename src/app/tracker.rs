//! Host-facing service over the tracked collection

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::app::command::{CommandGate, CommandState};
use crate::app::error::TrackerError;
use crate::app::refresh::{BatchReport, CancelHandle, RefreshOrchestrator, RefreshState};
use crate::config::threads_url;
use crate::game::checker::{self, RefreshOutcome};
use crate::game::collection::{Collection, CollectionEvent};
use crate::game::error::DuplicateError;
use crate::game::record::GameRecord;
use crate::game::sort::SortPolicy;
use crate::game::source::TitleSource;
use crate::game::store::CollectionStore;
use crate::thread::url::ThreadRef;

/// Runs user commands against the collection.
///
/// Adding, removing, syncing, refreshing and saving are mutually exclusive and
/// fail with [`TrackerError::Busy`] while another one runs. Flag edits are not
/// gated and wait for the collection lock instead.
pub struct Tracker {
    collection: tokio::sync::Mutex<Collection>,
    gate: CommandGate,
    source: Arc<dyn TitleSource>,
    store: CollectionStore,
    orchestrator: RefreshOrchestrator,
    policy: Mutex<SortPolicy>,
    site_url: String,
}

impl Tracker {
    /// Loads the stored collection and sorts it with `policy`
    pub fn new(
        source: Arc<dyn TitleSource>,
        store: CollectionStore,
        site_url: impl Into<String>,
        policy: SortPolicy,
    ) -> Self {
        let mut collection = Collection::from_records(store.load());
        collection.sort(&policy);

        Self {
            collection: tokio::sync::Mutex::new(collection),
            gate: CommandGate::new(),
            source,
            store,
            orchestrator: RefreshOrchestrator::new(),
            policy: Mutex::new(policy),
            site_url: site_url.into(),
        }
    }

    /// Forwards collection mutations to `events`
    pub fn with_events(mut self, events: UnboundedSender<CollectionEvent>) -> Self {
        let collection = std::mem::take(self.collection.get_mut());
        *self.collection.get_mut() = collection.with_events(events);
        self
    }

    pub fn state(&self) -> CommandState {
        self.gate.state()
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.orchestrator.state()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.orchestrator.cancel_handle()
    }

    pub fn sort_policy(&self) -> SortPolicy {
        *self.policy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the sort policy and re-sorts the collection
    pub async fn set_sort_policy(&self, policy: SortPolicy) {
        *self.policy.lock().unwrap_or_else(PoisonError::into_inner) = policy;
        self.collection.lock().await.sort(&policy);
    }

    /// Starts tracking the thread at `input`, returning its id.
    ///
    /// The name and latest version come from the thread title. Nothing is added
    /// when either cannot be read.
    pub async fn add_by_url(&self, input: &str) -> Result<String, TrackerError> {
        let _guard = self.gate.try_begin(CommandState::Adding)?;

        let input = input.trim();
        let prefix = threads_url(&self.site_url).to_lowercase();
        if !input.to_lowercase().contains(&prefix) {
            return Err(TrackerError::InvalidUrl(input.to_string()));
        }
        let thread = ThreadRef::parse(input)?;

        {
            let collection = self.collection.lock().await;
            if let Some(existing) = collection.get(thread.id()) {
                return Err(DuplicateError {
                    name: existing.name().to_string(),
                }
                .into());
            }
        }

        // The collection stays unlocked while the title is fetched
        let mut record = GameRecord::new(thread);
        checker::initialize(&mut record, self.source.as_ref()).await?;

        let id = record.id().to_string();
        let name = record.name().to_string();
        let policy = self.sort_policy();

        let mut collection = self.collection.lock().await;
        collection.add(record)?;
        collection.sort(&policy);

        info!("Now tracking {} ({})", name, id);
        Ok(id)
    }

    /// Stops tracking the game with `id`
    pub async fn remove(&self, id: &str) -> Result<GameRecord, TrackerError> {
        let _guard = self.gate.try_begin(CommandState::Removing)?;

        let removed = self
            .collection
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

        info!("Stopped tracking {} ({})", removed.name(), id);
        Ok(removed)
    }

    /// Marks the latest version of the game as owned
    pub async fn sync_version(&self, id: &str) -> Result<bool, TrackerError> {
        let _guard = self.gate.try_begin(CommandState::Syncing)?;
        self.modify(id, |collection| collection.sync_version(id)).await
    }

    pub async fn set_current_version(
        &self,
        id: &str,
        version: &str,
    ) -> Result<bool, TrackerError> {
        self.modify(id, |collection| collection.set_current_version(id, version)).await
    }

    pub async fn set_group(&self, id: &str, group: &str) -> Result<bool, TrackerError> {
        self.modify(id, |collection| collection.set_group(id, group)).await
    }

    pub async fn set_favorite(&self, id: &str, favorite: bool) -> Result<bool, TrackerError> {
        self.modify(id, |collection| collection.set_favorite(id, favorite)).await
    }

    pub async fn set_version_finished(
        &self,
        id: &str,
        finished: bool,
    ) -> Result<bool, TrackerError> {
        self.modify(id, |collection| {
            collection.set_version_finished(id, finished)
        })
        .await
    }

    async fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut Collection) -> bool,
    ) -> Result<bool, TrackerError> {
        let policy = self.sort_policy();
        let mut collection = self.collection.lock().await;
        if collection.get(id).is_none() {
            return Err(TrackerError::NotFound(id.to_string()));
        }

        let changed = change(&mut *collection);
        if changed {
            collection.sort(&policy);
        } else {
            debug!("{} is unchanged", id);
        }
        Ok(changed)
    }

    /// Checks one game for a new version
    pub async fn refresh_one(&self, id: &str) -> Result<RefreshOutcome, TrackerError> {
        let _guard = self.gate.try_begin(CommandState::RefreshingOne)?;
        let policy = self.sort_policy();

        let mut collection = self.collection.lock().await;
        let outcome = self
            .orchestrator
            .refresh_single(&mut collection, id, self.source.as_ref(), &policy)
            .await?;
        Ok(outcome)
    }

    /// Checks every game for a new version, stopping early when cancelled
    pub async fn refresh_all(&self) -> Result<BatchReport, TrackerError> {
        let _guard = self.gate.try_begin(CommandState::RefreshingAll)?;
        let policy = self.sort_policy();

        let mut collection = self.collection.lock().await;
        let report = self
            .orchestrator
            .refresh_all(&mut collection, self.source.as_ref(), &policy)
            .await?;
        Ok(report)
    }

    /// Writes the collection to the store and clears the unsaved-changes flag
    pub async fn save(&self) -> Result<(), TrackerError> {
        let _guard = self.gate.try_begin(CommandState::Saving)?;

        let mut collection = self.collection.lock().await;
        if !self.store.save(&collection.to_records()) {
            return Err(TrackerError::SaveFailed);
        }
        collection.mark_clean();
        Ok(())
    }

    /// Whether the collection changed since it was loaded or last saved
    pub async fn has_changes(&self) -> bool {
        self.collection.lock().await.is_dirty()
    }

    /// Snapshot of the games matching `filter`, in display order
    pub async fn list(&self, filter: &str) -> Vec<GameRecord> {
        self.collection
            .lock()
            .await
            .filter(filter, &self.site_url)
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<GameRecord> {
        self.collection.lock().await.get(id).cloned()
    }

    pub async fn groups(&self) -> Vec<String> {
        self.collection
            .lock()
            .await
            .groups()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
