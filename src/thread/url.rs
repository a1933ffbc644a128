//! Thread URL handling and identifier derivation

use serde::{Deserialize, Serialize};

/// Error returned when a thread URL does not have the `.../name.<id>/` shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid thread url: {0}")]
pub struct ThreadUrlError(pub String);

/// Location of a tracked thread together with its derived identifier.
///
/// The identifier is computed once from the URL and never recomputed, so both
/// fields are private and only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadRef {
    url: String,
    id: String,
}

impl ThreadRef {
    /// Creates a thread reference, deriving the id from `url`
    pub fn parse(url: &str) -> Result<Self, ThreadUrlError> {
        let url = url.trim();
        let id = thread_id_from_url(url).ok_or_else(|| ThreadUrlError(url.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            id: id.to_string(),
        })
    }

    /// Rebuilds a reference from persisted parts without re-deriving the id
    pub(crate) fn from_parts(url: String, id: String) -> Self {
        Self { url, id }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Returns the text between the last `.` and the last `/` of `url`.
///
/// `https://f95zone.to/threads/city-of-broken-dreamers.25739/` yields `25739`.
/// Returns `None` when the dot does not precede the slash, or when the text
/// between them is empty or spans more than one path segment.
pub fn thread_id_from_url(url: &str) -> Option<&str> {
    let begin = url.rfind('.')? + 1;
    let end = url.rfind('/')?;

    if begin >= end {
        return None;
    }

    let id = &url[begin..end];
    if id.contains('/') {
        return None;
    }

    Some(id)
}
