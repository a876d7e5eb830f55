//! Pull request repository

use async_trait::async_trait;
use buildfeed_client::{ClientError, GithubClient};
use buildfeed_core::dto::github::{CombinedStatus, PullRequest};

/// Read access to a repository's pull requests and commit statuses
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    /// Number of the newest pull request, if the repository has any
    async fn latest_pull_request(&self, repo: &str) -> Result<Option<u64>, ClientError>;

    /// Fetches a single pull request
    ///
    /// # Arguments
    /// * `repo` - Repository as `owner/name`
    /// * `number` - Pull request number
    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequest, ClientError>;

    /// Fetches the combined status of a commit
    async fn combined_status(&self, repo: &str, sha: &str) -> Result<CombinedStatus, ClientError>;
}

/// GitHub implementation of PullRequestRepository
pub struct HttpPullRequestRepository {
    client: GithubClient,
}

impl HttpPullRequestRepository {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PullRequestRepository for HttpPullRequestRepository {
    async fn latest_pull_request(&self, repo: &str) -> Result<Option<u64>, ClientError> {
        self.client.latest_pull_request_number(repo).await
    }

    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequest, ClientError> {
        self.client.get_pull_request(repo, number).await
    }

    async fn combined_status(&self, repo: &str, sha: &str) -> Result<CombinedStatus, ClientError> {
        self.client.get_combined_status(repo, sha).await
    }
}
