//! Forum thread page source

use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{DEFAULT_SITE_URL, FETCH_TIMEOUT_MS, THREADS_PATH_SEGMENT};
use crate::game::error::FetchError;
use crate::game::source::TitleSource;

/// Fetches thread pages over HTTP and reads the title from their ld+json metadata
pub struct HttpTitleSource {
    client: reqwest::Client,
    base_url: String,
    /// Matches `<script type="application/ld+json">...</script>` blocks
    ld_json_re: Regex,
}

impl HttpTitleSource {
    /// Creates a new HttpTitleSource for the site at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("thread-tracker/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            ld_json_re: Regex::new(
                r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
            )
            .expect("Invalid ld+json regex"),
        }
    }

    fn thread_url(&self, thread_id: &str) -> String {
        format!("{}/{}/{}/", self.base_url, THREADS_PATH_SEGMENT, thread_id)
    }

    /// Returns the `headline` of the first ld+json block that has one
    fn extract_headline(&self, html: &str) -> Option<String> {
        self.ld_json_re
            .captures_iter(html)
            .filter_map(|caps| {
                let body = caps.get(1)?.as_str();
                serde_json::from_str::<serde_json::Value>(body)
                    .inspect_err(|e| debug!("Skipping unreadable ld+json block: {}", e))
                    .ok()
            })
            .find_map(|value| {
                value
                    .get("headline")
                    .and_then(|headline| headline.as_str())
                    .map(str::to_string)
            })
    }
}

impl Default for HttpTitleSource {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_URL)
    }
}

#[async_trait::async_trait]
impl TitleSource for HttpTitleSource {
    async fn fetch_title(&self, thread_id: &str) -> Result<String, FetchError> {
        let url = self.thread_url(thread_id);
        debug!("Fetching thread page {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(thread_id.to_string()));
        }

        if !status.is_success() {
            warn!("Forum returned status {}: {}", status, url);
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let html = response.text().await?;

        self.extract_headline(&html)
            .ok_or_else(|| FetchError::MissingTitle(thread_id.to_string()))
    }
}
