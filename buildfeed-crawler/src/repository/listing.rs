//! Job-history listing repository

use async_trait::async_trait;
use buildfeed_client::{ClientError, ListingClient};

/// Source of job-history pages
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Fetches the HTML body of a job-history page
    ///
    /// Any non-2xx status or transport failure is an error; there is no
    /// partial discovery.
    async fn fetch_listing(&self, url: &str) -> Result<String, ClientError>;
}

/// HTTP implementation of ListingRepository
pub struct HttpListingRepository {
    client: ListingClient,
}

impl HttpListingRepository {
    pub fn new(client: ListingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ListingRepository for HttpListingRepository {
    async fn fetch_listing(&self, url: &str) -> Result<String, ClientError> {
        self.client.fetch_page(url).await
    }
}
