//! Buildfeed Crawler
//!
//! The stateful half of buildfeed: discovers builds on a job-history page,
//! skips the ones already forwarded, and forwards the rest to the analytics
//! platform.
//!
//! Architecture:
//! - Configuration: every tunable of a run, with validation
//! - Repositories: collaborator seams over the HTTP clients (listing,
//!   object storage, upload, pull requests)
//! - Tracker: durable per-job record of forwarded builds
//! - Resolver: build metadata from the `finished.json`/`started.json` markers
//! - Orchestrator: the per-run crawl loop
//! - Backfill: forwarding CI results of historical pull requests

pub mod backfill;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod repository;
pub mod resolver;
pub mod tracker;

pub use backfill::{Backfill, BackfillRequest, DEFAULT_CI_CONTEXT, PullRequestError};
pub use config::Config;
pub use error::{CrawlError, ResolutionError, TrackerError, UploadError};
pub use orchestrator::Crawler;
pub use resolver::{BuildResolver, StorageBuildResolver};
pub use tracker::{FileTrackerStore, TrackerStore};
