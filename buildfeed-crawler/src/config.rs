//! Crawler configuration
//!
//! Defines every tunable of a crawl or backfill run: where tracker files
//! live, how many builds a run may process, pacing between builds, and the
//! upstream service endpoints.

use buildfeed_client::{
    DEFAULT_GITHUB_URL, DEFAULT_INGEST_DOMAIN, DEFAULT_INGEST_URL, DEFAULT_STORAGE_URL,
    RetryPolicy, Secret,
};
use buildfeed_core::domain::location::DEFAULT_BUCKET;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CrawlError;

/// Human-facing storage browser used for build links
pub const DEFAULT_BROWSE_URL: &str = "https://gcsweb-ci.apps.ci.l2s4.p1.openshiftapps.com/gcs";

/// Crawler configuration
///
/// Timeouts and pacing are configurable so the same binary can run against
/// the production services or a local mock.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one tracker file per job
    pub tracker_dir: PathBuf,

    /// Maximum number of new builds processed per run
    pub limit: usize,

    /// Resolve builds without forwarding or tracking anything
    pub dry_run: bool,

    /// Pause between consecutive builds of a crawl
    pub build_delay: Duration,

    /// Pause between consecutive pull requests of a backfill
    pub pull_request_delay: Duration,

    /// Total time allowed for each HTTP request
    pub http_timeout: Duration,

    /// Public object storage endpoint (e.g., "https://storage.googleapis.com")
    pub storage_url: String,

    /// Bucket holding build artifacts
    pub bucket: String,

    /// Storage browser base URL for build links
    pub browse_url: String,

    /// Analytics platform base URL
    pub ingest_url: String,

    /// Analytics platform tenant domain
    pub ingest_domain: String,

    /// Analytics import token; only optional for dry runs
    pub ingest_token: Option<Secret>,

    /// Retry policy of build uploads
    pub upload_retry: RetryPolicy,

    /// GitHub API base URL
    pub github_url: String,

    /// GitHub token, needed for backfills only
    pub github_token: Option<Secret>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(tracker_dir: impl Into<PathBuf>) -> Self {
        Self {
            tracker_dir: tracker_dir.into(),
            limit: 50,
            dry_run: false,
            build_delay: Duration::from_secs(1),
            pull_request_delay: Duration::from_millis(500),
            http_timeout: Duration::from_secs(30),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            browse_url: DEFAULT_BROWSE_URL.to_string(),
            ingest_url: DEFAULT_INGEST_URL.to_string(),
            ingest_domain: DEFAULT_INGEST_DOMAIN.to_string(),
            ingest_token: None,
            upload_retry: RetryPolicy::default(),
            github_url: DEFAULT_GITHUB_URL.to_string(),
            github_token: None,
        }
    }

    /// Sets the analytics import token, ignoring blank values
    pub fn with_ingest_token(mut self, token: Option<String>) -> Self {
        self.ingest_token = token.map(Secret::new).filter(|t| !t.is_empty());
        self
    }

    /// Sets the GitHub token, ignoring blank values
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.map(Secret::new).filter(|t| !t.is_empty());
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.tracker_dir.as_os_str().is_empty() {
            return Err(CrawlError::config("tracker_dir cannot be empty"));
        }

        if self.limit == 0 {
            return Err(CrawlError::config("limit must be greater than 0"));
        }

        for (name, url) in [
            ("storage_url", &self.storage_url),
            ("browse_url", &self.browse_url),
            ("ingest_url", &self.ingest_url),
            ("github_url", &self.github_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CrawlError::config(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        if self.bucket.trim().is_empty() {
            return Err(CrawlError::config("bucket cannot be empty"));
        }

        if self.ingest_domain.trim().is_empty() {
            return Err(CrawlError::config("ingest_domain cannot be empty"));
        }

        if !self.dry_run && self.ingest_token.is_none() {
            return Err(CrawlError::config(
                "an ingestion token is required unless running in dry-run mode",
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("./tracker")
    }
}
