//! Title source test utilities

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use thread_tracker::game::error::FetchError;
use thread_tracker::game::source::TitleSource;
use thread_tracker::game::store::CollectionStore;

/// Title source answering from a table that tests can change between calls
#[derive(Default)]
pub struct ScriptedSource {
    titles: Mutex<HashMap<String, Result<String, u16>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(self, thread_id: &str, title: &str) -> Self {
        self.set_title(thread_id, title);
        self
    }

    /// Makes every fetch of `thread_id` fail with the given HTTP status
    pub fn with_failure(self, thread_id: &str, status: u16) -> Self {
        self.set_failure(thread_id, status);
        self
    }

    pub fn set_title(&self, thread_id: &str, title: &str) {
        self.titles
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), Ok(title.to_string()));
    }

    pub fn set_failure(&self, thread_id: &str, status: u16) {
        self.titles
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), Err(status));
    }

    /// Thread ids fetched so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TitleSource for ScriptedSource {
    async fn fetch_title(&self, thread_id: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(thread_id.to_string());

        match self.titles.lock().unwrap().get(thread_id) {
            Some(Ok(title)) => Ok(title.clone()),
            Some(Err(status)) => Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            ))),
            None => Err(FetchError::NotFound(thread_id.to_string())),
        }
    }
}

/// Builds a forum thread URL for `slug` and `id`
pub fn thread_url(slug: &str, id: &str) -> String {
    format!("https://f95zone.to/threads/{}.{}/", slug, id)
}

/// Create a store backed by a file in a fresh temporary directory
pub fn create_test_store() -> (TempDir, CollectionStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = CollectionStore::new(temp_dir.path().join("gameInfoCollection.json"));
    (temp_dir, store)
}
