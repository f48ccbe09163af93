//! WebDAV upload over HTTP PUT.

use std::path::Path;
use std::time::Duration;

use davify_core::{UploadFilename, WebDavConfig};
use thiserror::Error;
use tokio_util::io::ReaderStream;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// WebDAV client with basic-auth credentials from [`WebDavConfig`].
#[derive(Clone)]
pub struct WebDavClient {
    client: reqwest::Client,
    config: WebDavConfig,
}

impl WebDavClient {
    pub fn new(config: WebDavConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(WebDavClient { client, config })
    }

    /// Upload `local_path` under the composed remote name.
    ///
    /// The request body is streamed from disk. Returns the PUT target URL on
    /// success; any non-2xx status is an upload failure (nothing to roll
    /// back — the server either stored the file or it did not).
    pub async fn upload(&self, local_path: &Path, name: &UploadFilename) -> StorageResult<String> {
        let url = self.config.endpoint_url(&name.encoded_name());
        let size = tokio::fs::metadata(local_path).await?.len();
        let file = tokio::fs::File::open(local_path).await?;

        let start = std::time::Instant::now();

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("PUT {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(format!(
                "PUT {} returned status {}: {}",
                url, status, body
            )));
        }

        tracing::info!(
            url = %url,
            remote_name = %name.remote_name(),
            size_bytes = size,
            status = %status,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "WebDAV upload successful"
        );

        Ok(url)
    }
}
