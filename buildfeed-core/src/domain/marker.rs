//! Build marker objects
//!
//! The CI system writes `started.json` when a build begins and
//! `finished.json` once it reaches a terminal state. Both are small JSON
//! documents; only the fields this crate reads are modelled; unknown fields
//! are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::build::BuildOutcome;

/// Marker payload could not be decoded
#[derive(Debug, Error)]
#[error("malformed {marker}: {source}")]
pub struct MarkerError {
    pub marker: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// Contents of `finished.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishedMarker {
    /// Completion time in epoch seconds
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// Legacy boolean result flag
    #[serde(default)]
    pub passed: Option<bool>,

    /// Terminal result, e.g. `SUCCESS` or `FAILURE`
    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl FinishedMarker {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MarkerError> {
        serde_json::from_slice(bytes).map_err(|source| MarkerError {
            marker: "finished.json",
            source,
        })
    }

    /// Classifies the build outcome
    ///
    /// A finished build succeeded only when `result` is `SUCCESS`, or when
    /// `result` is absent or blank and `passed` is true. Everything else,
    /// including a marker with neither field, is a failure.
    pub fn outcome(&self) -> BuildOutcome {
        match self.result.as_deref().map(str::trim) {
            Some(result) if result.eq_ignore_ascii_case("SUCCESS") => BuildOutcome::Success,
            Some(result) if !result.is_empty() => BuildOutcome::Failure,
            _ if self.passed == Some(true) => BuildOutcome::Success,
            _ => BuildOutcome::Failure,
        }
    }

    /// Repository (`owner/name`) recorded in the marker metadata
    pub fn repo(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get("repo")?
            .as_str()
            .filter(|repo| !repo.is_empty())
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// Contents of `started.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartedMarker {
    /// Start time in epoch seconds
    #[serde(default)]
    pub timestamp: Option<i64>,

    /// Commit the build ran against
    #[serde(default, rename = "repo-commit")]
    pub repo_commit: Option<String>,
}

impl StartedMarker {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MarkerError> {
        serde_json::from_slice(bytes).map_err(|source| MarkerError {
            marker: "started.json",
            source,
        })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}
