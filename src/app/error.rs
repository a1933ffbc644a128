use thiserror::Error;

use crate::app::command::BusyError;
use crate::app::refresh::RefreshError;
use crate::game::error::{DuplicateError, InitializeError};
use crate::thread::url::ThreadUrlError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Busy(#[from] BusyError),

    #[error("Not a thread URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Duplicate(#[from] DuplicateError),

    #[error("Game {0} is not tracked")]
    NotFound(String),

    #[error(transparent)]
    Initialize(#[from] InitializeError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("Failed to save the collection")]
    SaveFailed,
}

impl From<ThreadUrlError> for TrackerError {
    fn from(e: ThreadUrlError) -> Self {
        TrackerError::InvalidUrl(e.0)
    }
}
