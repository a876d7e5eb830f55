//! Object storage locations of build artifacts

use serde::{Deserialize, Serialize};

use crate::domain::job::{BuildId, JobName};

/// Bucket that holds CI results
pub const DEFAULT_BUCKET: &str = "test-platform-results";

/// Marker object written when a build finishes
pub const FINISHED_MARKER: &str = "finished.json";

/// Marker object written when a build starts
pub const STARTED_MARKER: &str = "started.json";

/// Directory of a single build's artifacts inside a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub bucket: String,
    /// Object prefix without leading or trailing slashes
    pub prefix: String,
}

impl StorageLocation {
    pub fn new(bucket: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Location of a periodic build: `logs/<job>/<build>`
    pub fn for_build(bucket: impl Into<String>, job_name: &JobName, build_id: BuildId) -> Self {
        Self::new(bucket, format!("logs/{}/{}", job_name, build_id))
    }

    /// Derives a location from a CI details URL of the form
    /// `https://<host>/.../gs/<bucket>/<prefix>`
    ///
    /// Returns `None` when the URL does not point into a bucket.
    pub fn from_details_url(url: &str) -> Option<Self> {
        let (_, gcs_path) = url.rsplit_once("/gs/")?;
        let gcs_path = gcs_path.split(['?', '#']).next().unwrap_or_default();
        let (bucket, prefix) = gcs_path.trim_matches('/').split_once('/')?;

        if bucket.is_empty() || prefix.trim_matches('/').is_empty() {
            return None;
        }

        Some(Self::new(bucket, prefix))
    }

    /// Full object name of a file inside this location
    pub fn object(&self, name: &str) -> String {
        format!("{}/{}", self.prefix, name)
    }

    /// Human-facing link to this location under a storage browser
    pub fn browse_url(&self, browse_base: &str) -> String {
        format!(
            "{}/{}/{}/",
            browse_base.trim_end_matches('/'),
            self.bucket,
            self.prefix
        )
    }

    /// Job name and build ID encoded in the last two path segments
    pub fn job_and_build(&self) -> Option<(JobName, BuildId)> {
        let mut segments = self.prefix.rsplit('/');
        let build_id = segments.next()?.parse().ok()?;
        let job_name = segments.next()?.parse().ok()?;
        Some((job_name, build_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_build_layout() {
        let job: JobName = "periodic-e2e".parse().unwrap();
        let location =
            StorageLocation::for_build(DEFAULT_BUCKET, &job, BuildId::new(1234567890123456789));

        assert_eq!(location.prefix, "logs/periodic-e2e/1234567890123456789");
        assert_eq!(
            location.object(FINISHED_MARKER),
            "logs/periodic-e2e/1234567890123456789/finished.json"
        );
        assert_eq!(
            location.browse_url("https://gcsweb.example.com/gcs/"),
            "https://gcsweb.example.com/gcs/test-platform-results/logs/periodic-e2e/1234567890123456789/"
        );
    }

    #[test]
    fn test_from_details_url() {
        let url = "https://prow.ci.openshift.org/view/gs/test-platform-results/pr-logs/pull/codeready-toolchain_host-operator/1145/pull-ci-host-operator-master-e2e/1891795860363153408";
        let location = StorageLocation::from_details_url(url).unwrap();

        assert_eq!(location.bucket, "test-platform-results");
        assert_eq!(
            location.prefix,
            "pr-logs/pull/codeready-toolchain_host-operator/1145/pull-ci-host-operator-master-e2e/1891795860363153408"
        );

        let (job, build) = location.job_and_build().unwrap();
        assert_eq!(job.as_str(), "pull-ci-host-operator-master-e2e");
        assert_eq!(build.get(), 1891795860363153408);
    }

    #[test]
    fn test_from_details_url_rejects_non_bucket_urls() {
        assert!(StorageLocation::from_details_url("https://example.com/build/1").is_none());
        assert!(StorageLocation::from_details_url("https://example.com/gs/bucket-only").is_none());
        assert!(StorageLocation::from_details_url("https://example.com/gs/bucket/").is_none());
    }

    #[test]
    fn test_from_details_url_strips_query_and_trailing_slash() {
        let url = "https://host/view/gs/bucket/logs/job/42/?tab=1";
        let location = StorageLocation::from_details_url(url).unwrap();
        assert_eq!(location.bucket, "bucket");
        assert_eq!(location.prefix, "logs/job/42");
    }
}
