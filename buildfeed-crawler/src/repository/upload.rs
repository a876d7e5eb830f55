//! Upload collaborator
//!
//! Forwards resolved build records to the analytics platform. Retries live
//! inside the ingestion client; by the time an error reaches the caller the
//! retry policy is exhausted or the failure is terminal.

use async_trait::async_trait;
use buildfeed_client::IngestClient;
use buildfeed_core::domain::build::BuildRecord;

use crate::error::UploadError;

/// Destination of resolved builds
#[async_trait]
pub trait BuildUploader: Send + Sync {
    /// Forwards one build
    ///
    /// `Ok` means the platform confirmed the import. Records without a
    /// definitive outcome are rejected with [`UploadError::Unresolved`].
    async fn upload(&self, record: &BuildRecord) -> Result<(), UploadError>;
}

/// Analytics platform implementation of BuildUploader
pub struct HttpBuildUploader {
    client: IngestClient,
}

impl HttpBuildUploader {
    pub fn new(client: IngestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BuildUploader for HttpBuildUploader {
    async fn upload(&self, record: &BuildRecord) -> Result<(), UploadError> {
        if !record.outcome.is_definitive() {
            return Err(UploadError::Unresolved(record.build_id));
        }

        self.client.upload_build(record).await?;
        Ok(())
    }
}
