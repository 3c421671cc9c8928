use chrono::{DateTime, Utc};
use sm_core::{PageRecord, Result};
use sm_storage::LocalHistoryStore;
use tracing::{debug, info, warn};

use crate::extract::extract_content;
use crate::record::{build_record, is_capturable};

/// Records each completed page visit into the local history.
///
/// Visits are never blocked by capture or storage problems; those are logged and
/// the visit is skipped.
#[derive(Clone)]
pub struct VisitObserver {
    history: LocalHistoryStore,
}

impl VisitObserver {
    pub fn new(history: LocalHistoryStore) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &LocalHistoryStore {
        &self.history
    }

    /// Returns the stored record, or `None` when the visit was skipped.
    pub async fn on_visit(&self, url: &str, html: &str) -> Option<PageRecord> {
        self.on_visit_at(url, html, Utc::now()).await
    }

    pub async fn on_visit_at(
        &self,
        url: &str,
        html: &str,
        captured_at: DateTime<Utc>,
    ) -> Option<PageRecord> {
        if !is_capturable(url) {
            debug!("Skipping non-web page: {}", url);
            return None;
        }

        let content = match extract_content(html) {
            Ok(content) => content,
            Err(e) => {
                warn!("⚠️ Failed to extract {}: {}", url, e);
                return None;
            }
        };

        let record = build_record(url, &content, captured_at);
        self.history.merge(std::slice::from_ref(&record)).await?;
        info!("📄 Captured {}", url);
        Some(record)
    }
}

/// Download a page for capture.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    if !is_capturable(url) {
        return Err(sm_core::Error::InvalidUrl(url.to_string()));
    }

    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}
