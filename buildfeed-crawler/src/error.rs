//! Error types for crawling and backfilling
//!
//! Run-level errors ([`CrawlError`]) abort an invocation. Per-build errors
//! ([`ResolutionError`], [`UploadError`]) are caught by the orchestrator and
//! turn into a deferral of that single build.

use buildfeed_client::ClientError;
use buildfeed_core::domain::job::BuildId;
use buildfeed_core::domain::marker::MarkerError;
use buildfeed_core::listing::ListingError;
use std::path::PathBuf;
use thiserror::Error;

/// Tracker file could not be read or written
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A complete line of the tracker file is not a build ID
    #[error("corrupt tracker {} at line {line}: {content:?}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// Build metadata could not be read from storage
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to fetch {object}: {source}")]
    Fetch {
        object: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Marker(#[from] MarkerError),
}

/// Build could not be forwarded
#[derive(Debug, Error)]
pub enum UploadError {
    /// Only success and failure can be forwarded
    #[error("build {0} has no definitive outcome")]
    Unresolved(BuildId),

    #[error("upload rejected: {0}")]
    Rejected(#[from] ClientError),
}

/// Errors that abort a whole run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    MalformedUrl(#[from] ListingError),

    #[error("failed to fetch job history {url}: {source}")]
    ListingFetch {
        url: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Upload succeeded but the tracker append did not
    #[error("build {build_id} was uploaded but could not be recorded: {source}")]
    Untracked {
        build_id: BuildId,
        #[source]
        source: TrackerError,
    },

    #[error("failed to list pull requests: {0}")]
    PullRequests(#[source] ClientError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CrawlError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_names_the_uploaded_build() {
        let err = CrawlError::Untracked {
            build_id: BuildId::new(300000000000001),
            source: TrackerError::Io {
                path: PathBuf::from("/tracker/job.txt"),
                source: std::io::Error::other("disk full"),
            },
        };

        let message = err.to_string();
        assert!(message.contains("300000000000001"));
        assert!(message.contains("/tracker/job.txt"));
    }

    #[test]
    fn test_corrupt_reports_line() {
        let err = TrackerError::Corrupt {
            path: PathBuf::from("job.txt"),
            line: 3,
            content: "garbage".to_string(),
        };
        assert_eq!(err.to_string(), "corrupt tracker job.txt at line 3: \"garbage\"");
    }
}
