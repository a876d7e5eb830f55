//! Run summaries
//!
//! Transient counters surfaced to the operator at the end of a run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::build::BuildOutcome;
use crate::domain::job::{BuildId, JobName};

/// Where a build ended up after one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildDisposition {
    /// Forwarded and recorded in the tracker
    Tracked,
    /// Resolved, but the upload failed; retried next run
    Deferred,
    /// Still running, not yet published, or unreadable; retried next run
    Unresolvable,
    /// Resolved during a dry run; nothing was forwarded or recorded
    Verified,
}

impl BuildDisposition {
    pub fn is_success(self) -> bool {
        matches!(self, BuildDisposition::Tracked | BuildDisposition::Verified)
    }
}

/// Result of processing a single build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub build_id: BuildId,
    pub outcome: BuildOutcome,
    pub disposition: BuildDisposition,
    /// Reason for a deferral, if any
    pub detail: Option<String>,
}

/// Aggregate counters of one crawl invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub job_name: JobName,
    pub dry_run: bool,
    /// Distinct build IDs found in the listing
    pub discovered: usize,
    /// Discovered builds skipped because they were already forwarded
    pub already_tracked: usize,
    /// Discovered builds not yet forwarded
    pub new_builds: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub builds: Vec<BuildReport>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, job_name: JobName, dry_run: bool) -> Self {
        Self {
            run_id,
            job_name,
            dry_run,
            discovered: 0,
            already_tracked: 0,
            new_builds: 0,
            processed: 0,
            succeeded: 0,
            failed: 0,
            builds: Vec::new(),
        }
    }

    /// Adds one processed build to the counters
    pub fn record(&mut self, report: BuildReport) {
        self.processed += 1;
        if report.disposition.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.builds.push(report);
    }

    /// New builds left for a later run because of the processing limit
    pub fn remaining(&self) -> usize {
        self.new_builds.saturating_sub(self.processed)
    }
}

/// Aggregate counters of one pull-request backfill
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BackfillSummary {
    pub fn record(&mut self, succeeded: bool) {
        self.processed += 1;
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}
