//! Job-history page fetching

use reqwest::Client;
use tracing::debug;

use crate::error::Result;
use crate::{check_status, default_http_client};

/// Fetches job-history listing pages as HTML text
#[derive(Debug, Clone)]
pub struct ListingClient {
    client: Client,
}

impl ListingClient {
    pub fn new() -> Self {
        Self {
            client: default_http_client(),
        }
    }

    /// Create a listing client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch a job-history page
    ///
    /// # Arguments
    /// * `url` - The job-history URL
    ///
    /// # Returns
    /// The response body; any non-2xx status is an error
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching job history from {}", url);

        let response = self.client.get(url).send().await?;
        let body = check_status(response).await?.text().await?;

        debug!("Fetched {} bytes of job history", body.len());
        Ok(body)
    }
}

impl Default for ListingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_page_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/job-history/gs/bucket/logs/periodic-e2e"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<table>1891795860363153408</table>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ListingClient::new();
        let body = client
            .fetch_page(&format!("{}/job-history/gs/bucket/logs/periodic-e2e", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "<table>1891795860363153408</table>");
    }

    #[tokio::test]
    async fn test_fetch_page_non_success_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = ListingClient::new()
            .fetch_page(&format!("{}/job-history/x", server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert!(err.to_string().contains("bad gateway"));
    }
}
