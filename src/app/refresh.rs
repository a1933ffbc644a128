//! Bulk and single refresh of tracked games

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::game::checker::{RefreshOutcome, check_one};
use crate::game::collection::Collection;
use crate::game::error::FetchError;
use crate::game::sort::SortPolicy;
use crate::game::source::TitleSource;

#[derive(Debug, Error)]
pub enum RefreshError {
    /// A fetch failed mid-batch; games checked before it keep their new state
    #[error("Checking for updates stopped at game {id} after {processed} games: {source}")]
    BatchAborted {
        processed: usize,
        id: String,
        #[source]
        source: FetchError,
    },

    #[error("Game {0} is not in the collection")]
    NotFound(String),
}

/// Lifecycle of the bulk refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Running,
    Cancelled,
}

/// Cooperative cancellation flag shared with whoever may stop a bulk refresh
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests the running batch to stop before its next game
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    Cancelled,
}

/// Summary of a bulk refresh that ran to completion or was cancelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// Games checked, including those whose title could not be parsed
    pub processed: usize,
    /// Ids of games with a new latest version
    pub updated: Vec<String>,
    /// Ids of games whose title carried no recognizable version
    pub parse_failures: Vec<String>,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            status: BatchStatus::Completed,
            processed: 0,
            updated: Vec::new(),
            parse_failures: Vec::new(),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Drives [`check_one`] across the collection, one game at a time
#[derive(Debug, Default)]
pub struct RefreshOrchestrator {
    state: Mutex<RefreshState>,
    cancel: CancelHandle,
}

impl RefreshOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RefreshState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Handle for stopping the running batch.
    ///
    /// A cancel requested while idle stops the next batch before its first game.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Refreshes every game in current display order
    ///
    /// Handles:
    /// - Polling the cancel flag before each game (an in-flight fetch is never interrupted)
    /// - Announcing each game through [`CollectionEvent::Checking`](crate::game::collection::CollectionEvent::Checking) before it is fetched
    /// - Marking the collection dirty for every fetched title, since the check stamp moved
    /// - Continuing past titles without a recognizable version
    /// - Aborting the batch on the first fetch failure, keeping progress made so far
    /// - Re-sorting the collection however the batch ends
    pub async fn refresh_all(
        &self,
        collection: &mut Collection,
        source: &dyn TitleSource,
        policy: &SortPolicy,
    ) -> Result<BatchReport, RefreshError> {
        self.set_state(RefreshState::Running);

        let ids = collection.ids();
        let total = ids.len();
        info!("Checking {} games for updates", total);

        let mut report = BatchReport::new();
        let mut aborted = None;

        for (index, id) in ids.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Update check cancelled after {} of {} games", report.processed, total);
                report.status = BatchStatus::Cancelled;
                break;
            }

            collection.report_checking(&id, index + 1, total);
            let Some(record) = collection.get_mut(&id) else {
                continue;
            };

            let outcome = check_one(record, source).await;
            if !matches!(outcome, RefreshOutcome::FetchFailed(_)) {
                // The check stamp changed even when the version did not
                collection.mark_updated(&id);
            }

            match outcome {
                RefreshOutcome::Updated => report.updated.push(id),
                RefreshOutcome::Unchanged => {}
                RefreshOutcome::ParseFailed { .. } => report.parse_failures.push(id),
                RefreshOutcome::FetchFailed(e) => {
                    aborted = Some((id, e));
                    break;
                }
            }

            report.processed += 1;
            debug!("Checked {}/{} games", report.processed, total);
        }

        // A cancel consumed by this batch must not stop the next one
        self.cancel.reset();
        collection.sort(policy);

        if let Some((id, source)) = aborted {
            error!(
                "Update check aborted at {} after {} games: {}",
                id, report.processed, source
            );
            self.set_state(RefreshState::Idle);
            return Err(RefreshError::BatchAborted {
                processed: report.processed,
                id,
                source,
            });
        }

        match report.status {
            BatchStatus::Cancelled => self.set_state(RefreshState::Cancelled),
            BatchStatus::Completed => {
                info!(
                    "Update check finished: {} checked, {} updated, {} unreadable",
                    report.processed,
                    report.updated.len(),
                    report.parse_failures.len()
                );
                self.set_state(RefreshState::Idle);
            }
        }

        Ok(report)
    }

    /// Refreshes one game and re-sorts the collection.
    ///
    /// Fetch and parse failures are returned as outcomes, not errors.
    pub async fn refresh_single(
        &self,
        collection: &mut Collection,
        id: &str,
        source: &dyn TitleSource,
        policy: &SortPolicy,
    ) -> Result<RefreshOutcome, RefreshError> {
        let record = collection
            .get_mut(id)
            .ok_or_else(|| RefreshError::NotFound(id.to_string()))?;

        let outcome = check_one(record, source).await;
        match &outcome {
            RefreshOutcome::Updated | RefreshOutcome::Unchanged => collection.mark_updated(id),
            RefreshOutcome::ParseFailed { .. } => {
                warn!("Refresh of {} failed: {}", id, outcome);
                collection.mark_updated(id);
            }
            RefreshOutcome::FetchFailed(_) => warn!("Refresh of {} failed: {}", id, outcome),
        }

        collection.sort(policy);
        Ok(outcome)
    }
}
