//! Build domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::job::{BuildId, JobName};
use crate::domain::location::StorageLocation;

/// Repository used when a build's metadata does not name one
pub const UNKNOWN_REPO: &str = "openshift/unknown";

/// Commit used when a build's metadata does not name one
pub const UNKNOWN_COMMIT: &str = "unknown";

/// Terminal outcome of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildOutcome {
    Success,
    Failure,
    /// Still running, or results not yet published
    Unknown,
}

impl BuildOutcome {
    /// Whether the outcome can be forwarded
    pub fn is_definitive(self) -> bool {
        !matches!(self, BuildOutcome::Unknown)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildOutcome::Success => "success",
            BuildOutcome::Failure => "failure",
            BuildOutcome::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Identity credited with triggering a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredBy {
    pub name: String,
    pub email: String,
    pub account_id: String,
}

impl TriggeredBy {
    /// System account credited for periodic builds
    pub fn ci_system() -> Self {
        Self {
            name: "OpenShift CI System".to_string(),
            email: "openshift-ci@redhat.com".to_string(),
            account_id: "openshift-ci-robot".to_string(),
        }
    }
}

/// Resolved metadata of one build
///
/// Built fresh on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub job_name: JobName,
    pub build_id: BuildId,
    pub outcome: BuildOutcome,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub location: StorageLocation,
    /// Human-facing link to the build
    pub details_url: String,
    /// Repository as `owner/name`
    pub repo_full_name: String,
    pub commit_sha: String,
    pub triggered_by: TriggeredBy,
    /// Display name used by the analytics platform
    pub display_name: String,
}

impl BuildRecord {
    pub fn repo_url(&self) -> String {
        format!("https://github.com/{}", self.repo_full_name)
    }
}
