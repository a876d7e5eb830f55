//! Pull request backfill
//!
//! Forwards the CI result of historical pull requests. For every PR in a
//! range the head commit's status for one CI context is looked up; its
//! target URL points at the build's artifacts, which are resolved and
//! uploaded like a periodic build, credited to the PR author.
//!
//! Backfills do not consult the tracker.

use buildfeed_client::{ClientError, GithubClient};
use buildfeed_core::domain::build::{BuildRecord, TriggeredBy, UNKNOWN_REPO};
use buildfeed_core::domain::location::StorageLocation;
use buildfeed_core::domain::summary::BackfillSummary;
use buildfeed_core::dto::github::GithubUser;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{CrawlError, ResolutionError, UploadError};
use crate::orchestrator::{ingest_uploader, shared_http_client, storage_resolver};
use crate::repository::{BuildUploader, HttpPullRequestRepository, PullRequestRepository};
use crate::resolver::BuildResolver;

/// CI context backfilled when none is given
pub const DEFAULT_CI_CONTEXT: &str = "ci/prow/e2e";

/// Range of pull requests to backfill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillRequest {
    /// Repository as `owner/name`
    pub repo: String,
    /// First pull request number, inclusive
    pub start_pr: u64,
    /// Last pull request number, inclusive; defaults to the newest PR
    pub end_pr: Option<u64>,
    /// Prefix of the status context holding the CI result
    pub ci_context: String,
}

impl BackfillRequest {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            start_pr: 1,
            end_pr: None,
            ci_context: DEFAULT_CI_CONTEXT.to_string(),
        }
    }
}

/// Reason a single pull request was skipped
#[derive(Debug, Error)]
pub enum PullRequestError {
    #[error("GitHub request failed: {0}")]
    Github(#[from] ClientError),

    #[error("no {0:?} status on the head commit")]
    NoStatus(String),

    #[error("status is {0:?}, need success or failure")]
    NotFinished(String),

    #[error("target URL {0:?} does not point into a bucket")]
    InvalidTarget(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("build artifacts have no result")]
    Unresolved,

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Backfills CI results of historical pull requests
pub struct Backfill {
    pulls: Arc<dyn PullRequestRepository>,
    resolver: Arc<dyn BuildResolver>,
    uploader: Arc<dyn BuildUploader>,
    dry_run: bool,
    delay: Duration,
}

impl Backfill {
    pub fn new(
        config: &Config,
        pulls: Arc<dyn PullRequestRepository>,
        resolver: Arc<dyn BuildResolver>,
        uploader: Arc<dyn BuildUploader>,
    ) -> Self {
        Self {
            pulls,
            resolver,
            uploader,
            dry_run: config.dry_run,
            delay: config.pull_request_delay,
        }
    }

    /// Creates a backfill wired to the production services
    ///
    /// Validates the configuration first; a GitHub token is required.
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        config.validate()?;

        let http = shared_http_client(config)?;
        let pulls = Self::github_repository(config, http.clone())?;

        Ok(Self::new(
            config,
            Arc::new(pulls),
            Arc::new(storage_resolver(config, http.clone())),
            Arc::new(ingest_uploader(config, http)),
        ))
    }

    fn github_repository(
        config: &Config,
        http: reqwest::Client,
    ) -> Result<HttpPullRequestRepository, CrawlError> {
        let token = config
            .github_token
            .clone()
            .ok_or_else(|| CrawlError::config("a GitHub token is required for backfills"))?;

        Ok(HttpPullRequestRepository::new(GithubClient::with_client(
            config.github_url.clone(),
            token,
            http,
        )))
    }

    /// Backfills every pull request of the requested range
    ///
    /// Per-PR problems are logged and counted; only failing to determine
    /// the end of the range aborts the backfill.
    pub async fn run(&self, request: &BackfillRequest) -> Result<BackfillSummary, CrawlError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("backfill", %run_id, repo = %request.repo);

        self.run_range(request).instrument(span).await
    }

    async fn run_range(&self, request: &BackfillRequest) -> Result<BackfillSummary, CrawlError> {
        let end_pr = match request.end_pr {
            Some(end) => end,
            None => self
                .pulls
                .latest_pull_request(&request.repo)
                .await
                .map_err(CrawlError::PullRequests)?
                .unwrap_or(0),
        };

        let mut summary = BackfillSummary::default();
        if end_pr < request.start_pr {
            info!("No pull requests in range #{}..#{}", request.start_pr, end_pr);
            return Ok(summary);
        }

        info!(
            "Processing PRs #{} to #{} for {} (dry run: {})",
            request.start_pr, end_pr, request.repo, self.dry_run
        );

        for number in request.start_pr..=end_pr {
            if number > request.start_pr && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.process_pull_request(request, number).await {
                Ok(record) => {
                    info!("PR #{}: build {} ({})", number, record.build_id, record.outcome);
                    summary.record(true);
                }
                Err(e) => {
                    warn!("PR #{}: skipped: {}", number, e);
                    summary.record(false);
                }
            }
        }

        info!(
            "Backfill complete: {} processed, {} succeeded, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );

        Ok(summary)
    }

    async fn process_pull_request(
        &self,
        request: &BackfillRequest,
        number: u64,
    ) -> Result<BuildRecord, PullRequestError> {
        let repo = request.repo.as_str();
        let pr = self.pulls.pull_request(repo, number).await?;
        let status = self.pulls.combined_status(repo, &pr.head.sha).await?;

        let ci = status
            .find_context(&request.ci_context)
            .ok_or_else(|| PullRequestError::NoStatus(request.ci_context.clone()))?;
        if !ci.is_terminal() {
            return Err(PullRequestError::NotFinished(ci.state.clone()));
        }

        let target_url = ci.target_url.clone().unwrap_or_default();
        let location = StorageLocation::from_details_url(&target_url)
            .ok_or_else(|| PullRequestError::InvalidTarget(target_url.clone()))?;
        let (job_name, build_id) = location
            .job_and_build()
            .ok_or_else(|| PullRequestError::InvalidTarget(target_url.clone()))?;

        let mut record = self.resolver.resolve_at(&job_name, build_id, location).await?;
        if !record.outcome.is_definitive() {
            return Err(PullRequestError::Unresolved);
        }

        record.details_url = target_url;
        record.display_name = format!("OpenShift CI {}", number);
        record.triggered_by = pr
            .user
            .as_ref()
            .map(author)
            .unwrap_or_else(TriggeredBy::ci_system);
        if record.repo_full_name == UNKNOWN_REPO {
            record.repo_full_name = repo.to_string();
        }

        if self.dry_run {
            info!("Dry run: PR #{} resolved as {}", number, record.outcome);
            return Ok(record);
        }

        self.uploader.upload(&record).await?;
        Ok(record)
    }
}

/// Trigger identity of a pull request author
fn author(user: &GithubUser) -> TriggeredBy {
    let name = user
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| user.login.clone());
    let email = user
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("{}@users.noreply.github.com", name));

    TriggeredBy {
        name,
        email,
        account_id: user.login.clone(),
    }
}
