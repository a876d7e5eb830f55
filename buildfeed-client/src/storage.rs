//! Public object storage reads
//!
//! Objects are read anonymously through the bucket's HTTP endpoint
//! (`<base>/<bucket>/<object>`), so no storage credentials are needed.

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::Result;
use crate::{check_status, default_http_client, trim_base_url};

/// Public endpoint of the storage service
pub const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";

/// Anonymous reader for objects in public buckets
#[derive(Debug, Clone)]
pub struct StorageClient {
    /// Base URL of the storage endpoint (e.g., "https://storage.googleapis.com")
    base_url: String,
    client: Client,
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, default_http_client())
    }

    /// Create a storage client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            client,
        }
    }

    #[cfg(test)]
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the raw bytes of an object
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `object` - Object name, e.g. `logs/job/123/finished.json`
    ///
    /// # Returns
    /// `None` when the object does not exist
    pub async fn fetch_object(&self, bucket: &str, object: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/{}/{}", self.base_url, bucket, object.trim_start_matches('/'));
        debug!("Fetching object {}", url);

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Object {} does not exist", url);
            return Ok(None);
        }

        let bytes = check_status(response).await?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }
}
