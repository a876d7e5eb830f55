//! Object storage repository

use async_trait::async_trait;
use buildfeed_client::{ClientError, StorageClient};

/// Read access to build artifacts in object storage
#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Fetches the raw bytes of an object
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `object` - Object name inside the bucket
    ///
    /// # Returns
    /// `None` when the object does not exist
    async fn fetch_object(
        &self,
        bucket: &str,
        object: &str,
    ) -> Result<Option<Vec<u8>>, ClientError>;
}

/// HTTP implementation of ObjectRepository
pub struct HttpObjectRepository {
    client: StorageClient,
}

impl HttpObjectRepository {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectRepository for HttpObjectRepository {
    async fn fetch_object(
        &self,
        bucket: &str,
        object: &str,
    ) -> Result<Option<Vec<u8>>, ClientError> {
        self.client.fetch_object(bucket, object).await
    }
}
