//! Run orchestrator
//!
//! Drives one crawl of a job: discover builds on the job-history page, drop
//! the ones already tracked, and push each remaining build through
//! resolve, upload and track. Builds are processed one at a time in listing
//! order.
//!
//! A build enters the tracker only after the upload collaborator confirmed
//! it. Anything short of that leaves the build untracked so the next run
//! picks it up again.

use buildfeed_client::{IngestClient, ListingClient, Secret, StorageClient, http_client};
use buildfeed_core::domain::build::BuildOutcome;
use buildfeed_core::domain::job::{BuildId, JobName};
use buildfeed_core::domain::summary::{BuildDisposition, BuildReport, RunSummary};
use buildfeed_core::listing::{extract_build_ids, parse_job_name};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::CrawlError;
use crate::repository::{
    BuildUploader, HttpBuildUploader, HttpListingRepository, HttpObjectRepository,
    ListingRepository,
};
use crate::resolver::{BuildResolver, StorageBuildResolver};
use crate::tracker::{FileTrackerStore, TrackerStore};

/// Crawls job-history pages and forwards new builds
pub struct Crawler {
    listing: Arc<dyn ListingRepository>,
    resolver: Arc<dyn BuildResolver>,
    uploader: Arc<dyn BuildUploader>,
    tracker: Arc<dyn TrackerStore>,
    limit: usize,
    dry_run: bool,
    build_delay: Duration,
}

impl Crawler {
    /// Creates a crawler from its collaborators
    ///
    /// Only `limit`, `dry_run` and `build_delay` are read from `config`.
    pub fn new(
        config: &Config,
        listing: Arc<dyn ListingRepository>,
        resolver: Arc<dyn BuildResolver>,
        uploader: Arc<dyn BuildUploader>,
        tracker: Arc<dyn TrackerStore>,
    ) -> Self {
        Self {
            listing,
            resolver,
            uploader,
            tracker,
            limit: config.limit,
            dry_run: config.dry_run,
            build_delay: config.build_delay,
        }
    }

    /// Creates a crawler wired to the production services
    ///
    /// Validates the configuration first.
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        config.validate()?;

        let http = shared_http_client(config)?;
        let listing = HttpListingRepository::new(ListingClient::with_client(http.clone()));

        Ok(Self::new(
            config,
            Arc::new(listing),
            Arc::new(storage_resolver(config, http.clone())),
            Arc::new(ingest_uploader(config, http)),
            Arc::new(FileTrackerStore::new(config.tracker_dir.clone())),
        ))
    }

    /// Runs one crawl of the job behind `job_url`
    ///
    /// # Errors
    /// Fails without processing any build when the URL is malformed, the
    /// tracker is unreadable, or the listing cannot be fetched. Once
    /// processing started, only a tracker write failure aborts the run;
    /// per-build failures are reported in the summary.
    pub async fn run(&self, job_url: &str) -> Result<RunSummary, CrawlError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("crawl", %run_id);

        self.run_once(run_id, job_url).instrument(span).await
    }

    async fn run_once(&self, run_id: Uuid, job_url: &str) -> Result<RunSummary, CrawlError> {
        let job_name = parse_job_name(job_url)?;
        info!(
            "Crawling {} (limit: {}, dry run: {})",
            job_name, self.limit, self.dry_run
        );

        let tracked = self.tracker.load(&job_name)?;
        debug!("{} build(s) already tracked for {}", tracked.len(), job_name);

        let html = self
            .listing
            .fetch_listing(job_url)
            .await
            .map_err(|source| CrawlError::ListingFetch {
                url: job_url.to_string(),
                source,
            })?;

        let discovered = extract_build_ids(&html);
        let new_ids: Vec<BuildId> = discovered
            .iter()
            .copied()
            .filter(|id| !tracked.contains(id))
            .collect();

        let mut summary = RunSummary::new(run_id, job_name.clone(), self.dry_run);
        summary.discovered = discovered.len();
        summary.already_tracked = discovered.len() - new_ids.len();
        summary.new_builds = new_ids.len();

        info!(
            "Found {} build(s), {} new, {} already tracked",
            summary.discovered, summary.new_builds, summary.already_tracked
        );

        for (index, build_id) in new_ids.into_iter().take(self.limit).enumerate() {
            if index > 0 && !self.build_delay.is_zero() {
                tokio::time::sleep(self.build_delay).await;
            }

            let report = self.process_build(&job_name, build_id).await?;
            summary.record(report);
        }

        if summary.remaining() > 0 {
            info!(
                "Limit reached, {} new build(s) left for the next run",
                summary.remaining()
            );
        }

        info!(
            "Run complete: {} processed, {} succeeded, {} failed",
            summary.processed, summary.succeeded, summary.failed
        );

        Ok(summary)
    }

    /// Pushes one build through resolve, upload and track
    async fn process_build(
        &self,
        job_name: &JobName,
        build_id: BuildId,
    ) -> Result<BuildReport, CrawlError> {
        let record = match self.resolver.resolve(job_name, build_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to resolve build {}: {}", build_id, e);
                return Ok(report(
                    build_id,
                    BuildOutcome::Unknown,
                    BuildDisposition::Unresolvable,
                    Some(e.to_string()),
                ));
            }
        };

        if !record.outcome.is_definitive() {
            info!("Build {} has no result yet, retrying next run", build_id);
            return Ok(report(
                build_id,
                record.outcome,
                BuildDisposition::Unresolvable,
                Some("no result published yet".to_string()),
            ));
        }

        if self.dry_run {
            info!("Dry run: build {} resolved as {}", build_id, record.outcome);
            return Ok(report(build_id, record.outcome, BuildDisposition::Verified, None));
        }

        if let Err(e) = self.uploader.upload(&record).await {
            warn!("Failed to upload build {}: {}", build_id, e);
            return Ok(report(
                build_id,
                record.outcome,
                BuildDisposition::Deferred,
                Some(e.to_string()),
            ));
        }

        self.tracker
            .append(job_name, build_id)
            .map_err(|source| CrawlError::Untracked { build_id, source })?;

        info!("Build {} forwarded as {}", build_id, record.outcome);
        Ok(report(build_id, record.outcome, BuildDisposition::Tracked, None))
    }
}

pub(crate) fn shared_http_client(config: &Config) -> Result<reqwest::Client, CrawlError> {
    http_client(config.http_timeout)
        .map_err(|e| CrawlError::config(format!("failed to build HTTP client: {}", e)))
}

/// Build resolver reading markers from the configured bucket
pub(crate) fn storage_resolver(config: &Config, http: reqwest::Client) -> StorageBuildResolver {
    let storage = StorageClient::with_client(config.storage_url.clone(), http);
    let objects = HttpObjectRepository::new(storage);
    StorageBuildResolver::new(Arc::new(objects), config.bucket.clone(), config.browse_url.clone())
}

/// Uploader posting to the configured analytics platform
pub(crate) fn ingest_uploader(config: &Config, http: reqwest::Client) -> HttpBuildUploader {
    // Dry runs never upload, so they may run without a token
    let token = config.ingest_token.clone().unwrap_or_else(|| Secret::new(""));
    let client = IngestClient::with_client(
        config.ingest_url.clone(),
        config.ingest_domain.clone(),
        token,
        http,
    )
    .with_retry(config.upload_retry);

    HttpBuildUploader::new(client)
}

fn report(
    build_id: BuildId,
    outcome: BuildOutcome,
    disposition: BuildDisposition,
    detail: Option<String>,
) -> BuildReport {
    BuildReport {
        build_id,
        outcome,
        disposition,
        detail,
    }
}
