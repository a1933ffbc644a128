use thiserror::Error;

use crate::thread::title::TitleParseError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Thread not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Thread title missing from page: {0}")]
    MissingTitle(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Game \"{name}\" is already in the collection")]
pub struct DuplicateError {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum InitializeError {
    #[error("Couldn't find thread {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },

    #[error("Couldn't read title of thread {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: TitleParseError,
    },

    #[error("Title of thread {id} has no {field}")]
    Incomplete { id: String, field: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
