//! Latest version checking for a single game

use std::fmt;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::game::error::{FetchError, InitializeError};
use crate::game::record::GameRecord;
use crate::game::source::TitleSource;
use crate::thread::title::parse_title;

/// Result of checking one game for a new version
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The source published a version different from the stored latest one
    Updated,
    /// The source still shows the stored latest version
    Unchanged,
    /// The title was fetched but carried no recognizable version
    ParseFailed { title: String },
    /// The title could not be fetched
    FetchFailed(FetchError),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated)
    }
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshOutcome::Updated => f.write_str("new version found"),
            RefreshOutcome::Unchanged => f.write_str("no new version"),
            RefreshOutcome::ParseFailed { title } => {
                write!(f, "couldn't get version from title \"{}\"", title)
            }
            RefreshOutcome::FetchFailed(e) => write!(f, "couldn't fetch thread: {}", e),
        }
    }
}

/// Checks one game against its thread title
///
/// Handles:
/// - Fetching the title exactly once
/// - Stamping `last_checked` whenever a title was fetched, even if parsing fails
/// - Updating `latest_version` only when the observed version differs
pub async fn check_one(record: &mut GameRecord, source: &dyn TitleSource) -> RefreshOutcome {
    let title = match source.fetch_title(record.id()).await {
        Ok(title) => title,
        Err(e) => {
            warn!("Failed to fetch thread {} ({}): {}", record.name(), record.id(), e);
            return RefreshOutcome::FetchFailed(e);
        }
    };

    record.set_last_checked(Local::now());

    let version = match parse_title(&title) {
        Ok(parsed) => parsed.version,
        Err(e) => {
            debug!("Title of {} not recognized: {}", record.id(), e);
            None
        }
    };

    let Some(version) = version else {
        warn!("Couldn't get version of {} from title {:?}", record.id(), title);
        return RefreshOutcome::ParseFailed { title };
    };

    record.set_last_checked_version(version.clone());

    if record.set_latest_version(version) {
        info!(
            "New version of {} ({}): {}",
            record.name(),
            record.id(),
            record.latest_version()
        );
        RefreshOutcome::Updated
    } else {
        debug!("{} ({}) is unchanged", record.name(), record.id());
        RefreshOutcome::Unchanged
    }
}

/// Populates name and latest version of a newly added game.
///
/// The record is left untouched unless both fields were extracted.
pub async fn initialize(
    record: &mut GameRecord,
    source: &dyn TitleSource,
) -> Result<(), InitializeError> {
    let id = record.id().to_string();

    let title = source
        .fetch_title(&id)
        .await
        .map_err(|source| InitializeError::Fetch {
            id: id.clone(),
            source,
        })?;

    let parsed = parse_title(&title).map_err(|source| InitializeError::Parse {
        id: id.clone(),
        source,
    })?;

    let (name, version) = match (parsed.name, parsed.version) {
        (Some(name), Some(version)) => (name, version),
        (None, _) => return Err(InitializeError::Incomplete { id, field: "name" }),
        (_, None) => {
            return Err(InitializeError::Incomplete {
                id,
                field: "version",
            });
        }
    };

    info!("Initialized thread {}: {} {}", id, name, version);
    record.set_name(name);
    record.set_latest_version(version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::record::EMPTY_FIELD;
    use crate::game::source::MockTitleSource;
    use crate::thread::url::ThreadRef;

    fn record() -> GameRecord {
        let thread = ThreadRef::parse("https://f95zone.to/threads/city.25739/").unwrap();
        GameRecord::new(thread).with_name("City of Broken Dreamers")
    }

    fn source_returning(title: &'static str) -> MockTitleSource {
        let mut source = MockTitleSource::new();
        source
            .expect_fetch_title()
            .withf(|id| id == "25739")
            .returning(move |_| Ok(title.to_string()));
        source
    }

    #[tokio::test]
    async fn check_one_reports_updated_then_unchanged() {
        let source = source_returning("[Philly] City of Broken Dreamers [v1.02]");
        let mut record = record();

        let first = check_one(&mut record, &source).await;
        let second = check_one(&mut record, &source).await;

        assert!(matches!(first, RefreshOutcome::Updated));
        assert!(matches!(second, RefreshOutcome::Unchanged));
        assert_eq!(record.latest_version(), "v1.02");
        assert_eq!(record.last_checked_version(), "v1.02");
        assert!(record.last_checked().is_some());
    }

    #[tokio::test]
    async fn check_one_fetch_failure_leaves_record_untouched() {
        let mut source = MockTitleSource::new();
        source
            .expect_fetch_title()
            .times(1)
            .returning(|id| Err(FetchError::NotFound(id.to_string())));
        let mut record = record();

        let outcome = check_one(&mut record, &source).await;

        assert!(matches!(
            outcome,
            RefreshOutcome::FetchFailed(FetchError::NotFound(_))
        ));
        assert_eq!(record.last_checked(), None);
        assert_eq!(record.latest_version(), EMPTY_FIELD);
    }

    #[tokio::test]
    async fn check_one_parse_failure_still_stamps_last_checked() {
        let source = source_returning("Thread without any brackets");
        let mut record = record();

        let outcome = check_one(&mut record, &source).await;

        assert!(matches!(outcome, RefreshOutcome::ParseFailed { .. }));
        assert!(record.last_checked().is_some());
        assert_eq!(record.latest_version(), EMPTY_FIELD);
        assert_eq!(record.last_checked_version(), EMPTY_FIELD);
    }

    #[tokio::test]
    async fn check_one_records_checked_version_without_changing_latest() {
        let source = source_returning("[Philly] City of Broken Dreamers [v1.02]");
        let mut record = record();
        record.set_latest_version("v1.02");
        record.set_last_checked_version("v1.01");

        let outcome = check_one(&mut record, &source).await;

        assert!(matches!(outcome, RefreshOutcome::Unchanged));
        assert_eq!(record.last_checked_version(), "v1.02");
    }

    #[tokio::test]
    async fn initialize_sets_name_and_latest_version() {
        let source = source_returning("[Philly] City of Broken Dreamers [v1.02] [PhillyGames]");
        let thread = ThreadRef::parse("https://f95zone.to/threads/city.25739/").unwrap();
        let mut record = GameRecord::new(thread);

        initialize(&mut record, &source).await.unwrap();

        assert_eq!(record.name(), "City of Broken Dreamers");
        assert_eq!(record.latest_version(), "v1.02");
        assert_eq!(record.current_version(), EMPTY_FIELD);
        assert_eq!(record.last_checked(), None);
    }

    #[tokio::test]
    async fn initialize_fails_without_mutation_when_version_missing() {
        let source = source_returning("[Philly] City of Broken Dreamers [v1.02");
        let mut record = record();

        let result = initialize(&mut record, &source).await;

        assert!(matches!(
            result,
            Err(InitializeError::Incomplete {
                field: "version",
                ..
            })
        ));
        assert_eq!(record.name(), "City of Broken Dreamers");
        assert_eq!(record.latest_version(), EMPTY_FIELD);
    }

    #[tokio::test]
    async fn initialize_fails_on_fetch_error() {
        let mut source = MockTitleSource::new();
        source
            .expect_fetch_title()
            .returning(|id| Err(FetchError::NotFound(id.to_string())));
        let mut record = record();

        let result = initialize(&mut record, &source).await;

        assert!(matches!(result, Err(InitializeError::Fetch { .. })));
    }
}
