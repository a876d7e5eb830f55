//! Analytics platform ingestion client
//!
//! Imports normalized CI build records. Each build is posted to the import
//! endpoint of the repository it belongs to, so the repository's platform ID
//! is looked up first and cached for the lifetime of the client.

use buildfeed_core::domain::build::BuildRecord;
use buildfeed_core::dto::ingest::{CiBuildPayload, Repository};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;
use crate::secret::Secret;
use crate::{default_http_client, handle_empty_response, handle_response, trim_base_url};

/// Base URL of the analytics platform
pub const DEFAULT_INGEST_URL: &str = "https://logilica.io";

/// Tenant domain sent with every request
pub const DEFAULT_INGEST_DOMAIN: &str = "redhat";

const TOKEN_HEADER: &str = "x-lgca-token";
const DOMAIN_HEADER: &str = "x-lgca-domain";

/// HTTP client for the analytics platform's import API
#[derive(Debug)]
pub struct IngestClient {
    base_url: String,
    domain: String,
    token: Secret,
    client: Client,
    retry: RetryPolicy,
    /// Repository name -> platform ID, filled on first lookup
    repositories: Mutex<Option<HashMap<String, String>>>,
}

impl IngestClient {
    /// Create a new ingestion client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the platform (e.g., "https://logilica.io")
    /// * `domain` - Tenant domain
    /// * `token` - Import API token
    pub fn new(base_url: impl Into<String>, domain: impl Into<String>, token: Secret) -> Self {
        Self::with_client(base_url, domain, token, default_http_client())
    }

    /// Create an ingestion client with a custom HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        domain: impl Into<String>,
        token: Secret,
        client: Client,
    ) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            domain: domain.into(),
            token,
            client,
            retry: RetryPolicy::default(),
            repositories: Mutex::new(None),
        }
    }

    /// Replace the retry policy used by [`IngestClient::upload_build`]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut token = HeaderValue::from_str(self.token.expose()).map_err(|_| {
            ClientError::InvalidRequest("token is not a valid header value".to_string())
        })?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let domain = HeaderValue::from_str(&self.domain)
            .map_err(|_| ClientError::InvalidRequest(format!("invalid domain {:?}", self.domain)))?;
        headers.insert(DOMAIN_HEADER, domain);

        Ok(headers)
    }

    // =============================================================================
    // Repositories
    // =============================================================================

    /// List repositories registered with the platform
    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let url = format!("{}/api/import/v1/repositories", self.base_url);
        let response = self.client.get(&url).headers(self.headers()?).send().await?;

        handle_response(response).await
    }

    /// Resolve a repository name (`owner/name`) to its platform ID
    ///
    /// The repository list is fetched once and cached. Fails with
    /// [`ClientError::NotFound`] when the platform does not know the
    /// repository.
    pub async fn find_repository_id(&self, repo_full_name: &str) -> Result<String> {
        if let Some(id) = self.cached_repository_id(repo_full_name)? {
            return Ok(id);
        }

        let repositories = self.list_repositories().await?;
        debug!("Fetched {} repositories from the platform", repositories.len());

        let index: HashMap<String, String> =
            repositories.into_iter().map(|r| (r.name, r.id)).collect();
        let found = index.get(repo_full_name).cloned();

        *self.lock_repositories()? = Some(index);

        found.ok_or_else(|| {
            ClientError::NotFound(format!("repository {} is not registered", repo_full_name))
        })
    }

    fn cached_repository_id(&self, repo_full_name: &str) -> Result<Option<String>> {
        Ok(self
            .lock_repositories()?
            .as_ref()
            .and_then(|index| index.get(repo_full_name).cloned()))
    }

    fn lock_repositories(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<HashMap<String, String>>>> {
        self.repositories
            .lock()
            .map_err(|e| ClientError::InvalidRequest(format!("repository cache poisoned: {}", e)))
    }

    // =============================================================================
    // Builds
    // =============================================================================

    /// Post one CI build to a repository's import endpoint
    ///
    /// # Arguments
    /// * `repo_id` - Platform ID of the repository
    /// * `payload` - The build to import
    pub async fn create_ci_build(&self, repo_id: &str, payload: &CiBuildPayload) -> Result<()> {
        let url = format!("{}/api/import/v1/ci_build/{}/create", self.base_url, repo_id);
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&[payload])
            .send()
            .await?;

        handle_empty_response(response).await
    }

    /// Forward a resolved build record, retrying transient failures
    ///
    /// Records without a definitive outcome are rejected without any request
    /// being made. Returns once the platform accepted the build, or with the
    /// last error once the retry policy is exhausted.
    pub async fn upload_build(&self, record: &BuildRecord) -> Result<()> {
        let payload = CiBuildPayload::try_from(record)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        let payload = &payload;
        let what = format!("upload of build {}", record.build_id);

        self.retry
            .run(&what, move || async move {
                let repo_id = self.find_repository_id(&record.repo_full_name).await?;
                self.create_ci_build(&repo_id, payload).await
            })
            .await?;

        info!(
            "Uploaded build {} of {} ({})",
            record.build_id, record.job_name, record.outcome
        );
        Ok(())
    }
}
