//! Title source trait for fetching thread titles

#[cfg(test)]
use mockall::automock;

use crate::game::error::FetchError;

/// Capability for fetching the raw title text of a thread
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TitleSource: Send + Sync {
    /// Fetches the title of a thread
    ///
    /// # Arguments
    /// * `thread_id` - The numeric thread id derived from the thread URL
    ///
    /// # Returns
    /// * `Ok(String)` - The raw thread title, e.g. `[Tag] Name [v1.0] [Developer]`
    /// * `Err(FetchError)` - If the thread could not be fetched or has no title
    async fn fetch_title(&self, thread_id: &str) -> Result<String, FetchError>;
}
