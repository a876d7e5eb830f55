//! Buildfeed HTTP Clients
//!
//! Typed HTTP clients for every upstream service the forwarder talks to:
//!
//! - [`ListingClient`]: fetches job-history pages
//! - [`StorageClient`]: reads objects from a public storage bucket
//! - [`IngestClient`]: imports CI builds into the analytics platform, with
//!   bounded retries
//! - [`GithubClient`]: reads pull requests and commit statuses
//!
//! # Example
//!
//! ```no_run
//! use buildfeed_client::{ListingClient, StorageClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let job_url = "https://prow.ci.openshift.org/job-history/gs/test-platform-results/logs/e2e";
//!     let html = ListingClient::new().fetch_page(job_url).await?;
//!
//!     let storage = StorageClient::new("https://storage.googleapis.com");
//!     let object = "logs/e2e/1891795860363153408/finished.json";
//!     let finished = storage.fetch_object("test-platform-results", object).await?;
//!
//!     println!("{} bytes of HTML, finished marker present: {}", html.len(), finished.is_some());
//!     Ok(())
//! }
//! ```

pub mod error;
mod github;
mod ingest;
mod listing;
mod retry;
mod secret;
mod storage;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use github::{DEFAULT_GITHUB_URL, GithubClient};
pub use ingest::{DEFAULT_INGEST_DOMAIN, DEFAULT_INGEST_URL, IngestClient};
pub use listing::ListingClient;
pub use retry::RetryPolicy;
pub use secret::Secret;
pub use storage::{DEFAULT_STORAGE_URL, StorageClient};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("buildfeed/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with the given request timeout
///
/// # Arguments
/// * `timeout` - Total time allowed for each request
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ClientError::from)
}

fn default_http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Fail with an API error unless the response has a success status
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response)
}

/// Handle an API response and deserialize JSON
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Handle an API response that returns no meaningful content
async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    check_status(response).await.map(|_| ())
}

fn trim_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        assert!(http_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(trim_base_url("http://localhost:8080"), "http://localhost:8080");
    }
}
