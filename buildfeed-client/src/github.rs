//! GitHub REST API client
//!
//! Read-only access to pull requests and commit statuses, used to backfill
//! CI results of historical pull requests.

use buildfeed_core::dto::github::{CombinedStatus, PullRequest};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};

use crate::error::{ClientError, Result};
use crate::secret::Secret;
use crate::{default_http_client, handle_response, trim_base_url};

/// Base URL of the public GitHub API
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// HTTP client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GithubClient {
    base_url: String,
    token: Secret,
    client: Client,
}

impl GithubClient {
    pub fn new(base_url: impl Into<String>, token: Secret) -> Self {
        Self::with_client(base_url, token, default_http_client())
    }

    /// Create a GitHub client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, token: Secret, client: Client) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            token,
            client,
        }
    }

    fn get(&self, url: &str) -> Result<RequestBuilder> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let mut auth =
            HeaderValue::from_str(&format!("token {}", self.token.expose())).map_err(|_| {
                ClientError::InvalidRequest("token is not a valid header value".to_string())
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(self.client.get(url).headers(headers))
    }

    /// Get a single pull request
    ///
    /// # Arguments
    /// * `repo` - Repository as `owner/name`
    /// * `number` - Pull request number
    pub async fn get_pull_request(&self, repo: &str, number: u64) -> Result<PullRequest> {
        let url = format!("{}/repos/{}/pulls/{}", self.base_url, repo, number);
        let response = self.get(&url)?.send().await?;

        handle_response(response).await
    }

    /// Get the combined status of a commit
    ///
    /// # Arguments
    /// * `repo` - Repository as `owner/name`
    /// * `sha` - Commit SHA
    pub async fn get_combined_status(&self, repo: &str, sha: &str) -> Result<CombinedStatus> {
        let url = format!("{}/repos/{}/commits/{}/status", self.base_url, repo, sha);
        let response = self.get(&url)?.send().await?;

        handle_response(response).await
    }

    /// Number of the most recently created pull request, open or closed
    ///
    /// Returns `None` for a repository without pull requests.
    pub async fn latest_pull_request_number(&self, repo: &str) -> Result<Option<u64>> {
        let url = format!("{}/repos/{}/pulls", self.base_url, repo);
        let response = self
            .get(&url)?
            .query(&[("per_page", "1"), ("state", "all")])
            .send()
            .await?;

        let pulls: Vec<PullRequest> = handle_response(response).await?;
        Ok(pulls.first().map(|pr| pr.number))
    }
}
