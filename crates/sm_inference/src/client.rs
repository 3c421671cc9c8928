use futures_util::TryStreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sm_core::{Result, UploadFlag, GENERIC_ERROR_MESSAGE};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::stream::StreamEventReader;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a, T> {
    data: &'a [T],
    user_id: String,
    flag: UploadFlag,
}

#[derive(Deserialize)]
struct UploadResponse {
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    user_id: String,
    query: &'a str,
    flag: UploadFlag,
}

/// Client for the remote retrieval service.
pub struct RemoteClient {
    client: Client,
    base_url: Url,
    config: ClientConfig,
}

impl RemoteClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.host.trim_end_matches('/'))
            .map_err(|e| sm_core::Error::InvalidUrl(format!("{}: {}", config.host, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(sm_core::Error::InvalidUrl(format!(
                "{}: only http and https hosts are supported",
                config.host
            )));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Upload a corpus to `/save-data`. An empty corpus sends nothing.
    pub async fn upload<T>(&self, data: &[T], user_id: &str, flag: UploadFlag) -> Result<()>
    where
        T: Serialize + Sync,
    {
        if data.is_empty() {
            debug!("Nothing to upload for {}", flag);
            return Ok(());
        }

        let request = UploadRequest {
            data,
            user_id: flag.scoped_user_id(user_id),
            flag,
        };

        let response = self
            .client
            .post(self.endpoint("save-data"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(sm_core::Error::Upload(format!(
                "Upload rejected with status {}",
                status
            )));
        }

        let body = response.json::<UploadResponse>().await.map_err(|e| {
            sm_core::Error::Upload(format!("Unexpected upload response: {}", e))
        })?;
        if !body.success {
            return Err(sm_core::Error::Upload(
                "Error uploading data, please try again".to_string(),
            ));
        }

        info!("📤 Uploaded {} {} entries", data.len(), flag);
        Ok(())
    }

    /// Start a streaming search.
    ///
    /// Never fails: a request that cannot be opened, a non-success status or a
    /// missing body all produce a reader that yields one `error` event. `cancel`
    /// covers the whole search, the wait for response headers included; a search
    /// cancelled at any point yields no further events.
    pub async fn search_stream(
        &self,
        user_id: &str,
        query: &str,
        flag: UploadFlag,
        cancel: CancellationToken,
    ) -> StreamEventReader {
        let request = SearchRequest {
            user_id: flag.scoped_user_id(user_id),
            query,
            flag,
        };

        let send = self
            .client
            .post(self.endpoint("search-stream"))
            .json(&request)
            .send();

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Search cancelled before the stream opened");
                return StreamEventReader::closed();
            }
            opened = tokio::time::timeout(self.config.idle_timeout, send) => opened,
        };

        let response = match opened {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Streaming request failed: {}", e);
                return StreamEventReader::failed(GENERIC_ERROR_MESSAGE);
            }
            Err(_) => {
                warn!("Streaming request timed out after {:?}", self.config.idle_timeout);
                return StreamEventReader::failed(crate::stream::TIMEOUT_MESSAGE);
            }
        };

        if !response.status().is_success() {
            warn!("Streaming request failed with status {}", response.status());
            return StreamEventReader::failed(GENERIC_ERROR_MESSAGE);
        }

        debug!("🔍 Search stream opened for {}", flag);
        let body = response.bytes_stream().map_err(sm_core::Error::Http);
        StreamEventReader::new(body)
            .with_idle_timeout(self.config.idle_timeout)
            .with_cancellation(cancel)
    }
}

impl fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("idle_timeout", &self.config.idle_timeout)
            .finish()
    }
}
