//! Build resolver
//!
//! Reads the `finished.json` and `started.json` markers of a build from
//! object storage and turns them into a [`BuildRecord`].

use async_trait::async_trait;
use buildfeed_core::domain::build::{
    BuildOutcome, BuildRecord, TriggeredBy, UNKNOWN_COMMIT, UNKNOWN_REPO,
};
use buildfeed_core::domain::job::{BuildId, JobName};
use buildfeed_core::domain::location::{FINISHED_MARKER, STARTED_MARKER, StorageLocation};
use buildfeed_core::domain::marker::{FinishedMarker, StartedMarker};
use std::sync::Arc;
use tracing::debug;

use crate::error::ResolutionError;
use crate::repository::ObjectRepository;

/// Resolves the metadata of a single build
#[async_trait]
pub trait BuildResolver: Send + Sync {
    /// Resolves a periodic build stored under `logs/<job>/<build>`
    ///
    /// A build that has not published its markers yet resolves to
    /// [`BuildOutcome::Unknown`]; errors are reserved for storage failures
    /// and unreadable markers.
    async fn resolve(
        &self,
        job_name: &JobName,
        build_id: BuildId,
    ) -> Result<BuildRecord, ResolutionError>;

    /// Resolves a build stored at an explicit location
    async fn resolve_at(
        &self,
        job_name: &JobName,
        build_id: BuildId,
        location: StorageLocation,
    ) -> Result<BuildRecord, ResolutionError>;
}

/// Object storage implementation of BuildResolver
pub struct StorageBuildResolver {
    objects: Arc<dyn ObjectRepository>,
    bucket: String,
    browse_url: String,
}

impl StorageBuildResolver {
    /// Creates a new resolver
    ///
    /// # Arguments
    /// * `objects` - Storage to read markers from
    /// * `bucket` - Bucket holding periodic builds
    /// * `browse_url` - Storage browser base used for build links
    pub fn new(
        objects: Arc<dyn ObjectRepository>,
        bucket: impl Into<String>,
        browse_url: impl Into<String>,
    ) -> Self {
        Self {
            objects,
            bucket: bucket.into(),
            browse_url: browse_url.into(),
        }
    }

    async fn fetch(
        &self,
        location: &StorageLocation,
        marker: &str,
    ) -> Result<Option<Vec<u8>>, ResolutionError> {
        let object = location.object(marker);
        self.objects
            .fetch_object(&location.bucket, &object)
            .await
            .map_err(|source| ResolutionError::Fetch {
                object: format!("gs://{}/{}", location.bucket, object),
                source,
            })
    }
}

#[async_trait]
impl BuildResolver for StorageBuildResolver {
    async fn resolve(
        &self,
        job_name: &JobName,
        build_id: BuildId,
    ) -> Result<BuildRecord, ResolutionError> {
        let location = StorageLocation::for_build(self.bucket.clone(), job_name, build_id);
        self.resolve_at(job_name, build_id, location).await
    }

    async fn resolve_at(
        &self,
        job_name: &JobName,
        build_id: BuildId,
        location: StorageLocation,
    ) -> Result<BuildRecord, ResolutionError> {
        let mut record = BuildRecord {
            job_name: job_name.clone(),
            build_id,
            outcome: BuildOutcome::Unknown,
            started_at: None,
            finished_at: None,
            details_url: location.browse_url(&self.browse_url),
            location,
            repo_full_name: UNKNOWN_REPO.to_string(),
            commit_sha: UNKNOWN_COMMIT.to_string(),
            triggered_by: TriggeredBy::ci_system(),
            display_name: format!("OpenShift CI {}", job_name.short_name()),
        };

        let Some(finished) = self.fetch(&record.location, FINISHED_MARKER).await? else {
            debug!("Build {} has no {} yet", build_id, FINISHED_MARKER);
            return Ok(record);
        };
        let finished = FinishedMarker::from_slice(&finished)?;

        let Some(started) = self.fetch(&record.location, STARTED_MARKER).await? else {
            debug!("Build {} has no {}", build_id, STARTED_MARKER);
            return Ok(record);
        };
        let started = StartedMarker::from_slice(&started)?;

        record.outcome = finished.outcome();
        record.started_at = started.started_at();
        record.finished_at = finished.finished_at();
        if let Some(repo) = finished.repo() {
            record.repo_full_name = repo.to_string();
        }
        if let Some(commit) = started.repo_commit.filter(|c| !c.is_empty()) {
            record.commit_sha = commit;
        }

        debug!("Resolved build {} of {}: {}", build_id, job_name, record.outcome);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildfeed_client::ClientError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BROWSE: &str = "https://gcsweb.example.com/gcs";

    /// In-memory bucket; objects named in `failing` return a server error
    #[derive(Default)]
    struct FakeObjects {
        objects: HashMap<String, Vec<u8>>,
        failing: Vec<String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeObjects {
        fn with(mut self, object: &str, body: &str) -> Self {
            self.objects.insert(object.to_string(), body.as_bytes().to_vec());
            self
        }
    }

    #[async_trait]
    impl ObjectRepository for FakeObjects {
        async fn fetch_object(
            &self,
            bucket: &str,
            object: &str,
        ) -> Result<Option<Vec<u8>>, ClientError> {
            self.requested.lock().unwrap().push(format!("{}/{}", bucket, object));
            if self.failing.iter().any(|o| o == object) {
                return Err(ClientError::api_error(503, "unavailable"));
            }
            Ok(self.objects.get(object).cloned())
        }
    }

    fn job() -> JobName {
        "periodic-ci-codeready-toolchain-e2e-daily".parse().unwrap()
    }

    const BUILD: BuildId = BuildId::new(1891795860363153408);
    const PREFIX: &str = "logs/periodic-ci-codeready-toolchain-e2e-daily/1891795860363153408";

    fn resolver(objects: FakeObjects) -> StorageBuildResolver {
        StorageBuildResolver::new(Arc::new(objects), "test-platform-results", BROWSE)
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let objects = FakeObjects::default()
            .with(
                &format!("{}/finished.json", PREFIX),
                r#"{"timestamp": 1739900000, "passed": true, "result": "SUCCESS",
                    "metadata": {"repo": "codeready-toolchain/toolchain-e2e"}}"#,
            )
            .with(
                &format!("{}/started.json", PREFIX),
                r#"{"timestamp": 1739896400, "repo-commit": "0123abcd"}"#,
            );

        let record = resolver(objects).resolve(&job(), BUILD).await.unwrap();

        assert_eq!(record.outcome, BuildOutcome::Success);
        assert_eq!(record.repo_full_name, "codeready-toolchain/toolchain-e2e");
        assert_eq!(record.commit_sha, "0123abcd");
        assert_eq!(record.started_at.unwrap().timestamp(), 1739896400);
        assert_eq!(record.finished_at.unwrap().timestamp(), 1739900000);
        assert_eq!(record.display_name, "OpenShift CI daily");
        assert_eq!(record.triggered_by, TriggeredBy::ci_system());
        assert_eq!(
            record.details_url,
            format!("{}/test-platform-results/{}/", BROWSE, PREFIX)
        );
    }

    #[tokio::test]
    async fn test_resolve_failure_with_fallbacks() {
        let objects = FakeObjects::default()
            .with(
                &format!("{}/finished.json", PREFIX),
                r#"{"timestamp": 1739900000, "result": "FAILURE"}"#,
            )
            .with(&format!("{}/started.json", PREFIX), r#"{"timestamp": 1739896400}"#);

        let record = resolver(objects).resolve(&job(), BUILD).await.unwrap();

        assert_eq!(record.outcome, BuildOutcome::Failure);
        assert_eq!(record.repo_full_name, UNKNOWN_REPO);
        assert_eq!(record.commit_sha, UNKNOWN_COMMIT);
    }

    #[tokio::test]
    async fn test_running_build_is_unknown() {
        let objects = FakeObjects::default()
            .with(&format!("{}/started.json", PREFIX), r#"{"timestamp": 1739896400}"#);

        let fake = Arc::new(objects);
        let resolver = StorageBuildResolver::new(fake.clone(), "test-platform-results", BROWSE);
        let record = resolver.resolve(&job(), BUILD).await.unwrap();

        assert_eq!(record.outcome, BuildOutcome::Unknown);
        // started.json is not needed once finished.json is known to be missing
        assert_eq!(fake.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_started_marker_is_unknown() {
        let objects = FakeObjects::default()
            .with(&format!("{}/finished.json", PREFIX), r#"{"result": "SUCCESS"}"#);

        let record = resolver(objects).resolve(&job(), BUILD).await.unwrap();

        assert_eq!(record.outcome, BuildOutcome::Unknown);
    }

    #[tokio::test]
    async fn test_finished_marker_without_result_is_failure() {
        let objects = FakeObjects::default()
            .with(&format!("{}/finished.json", PREFIX), r#"{"timestamp": 1739900000}"#)
            .with(&format!("{}/started.json", PREFIX), r#"{"timestamp": 1739896400}"#);

        let record = resolver(objects).resolve(&job(), BUILD).await.unwrap();

        assert_eq!(record.outcome, BuildOutcome::Failure);
        assert!(record.outcome.is_definitive());
    }

    #[tokio::test]
    async fn test_malformed_marker_is_an_error() {
        let objects = FakeObjects::default()
            .with(&format!("{}/finished.json", PREFIX), "{not json")
            .with(&format!("{}/started.json", PREFIX), "{}");

        let err = resolver(objects).resolve(&job(), BUILD).await.unwrap_err();

        assert!(matches!(err, ResolutionError::Marker(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_an_error() {
        let objects = FakeObjects {
            failing: vec![format!("{}/finished.json", PREFIX)],
            ..Default::default()
        };

        let err = resolver(objects).resolve(&job(), BUILD).await.unwrap_err();

        match err {
            ResolutionError::Fetch { object, .. } => {
                assert_eq!(object, format!("gs://test-platform-results/{}/finished.json", PREFIX))
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_at_explicit_location() {
        let prefix = "pr-logs/pull/org_repo/1145/pull-ci-org-repo-master-e2e/1891795860363153408";
        let objects = FakeObjects::default()
            .with(&format!("{}/finished.json", prefix), r#"{"passed": false}"#)
            .with(&format!("{}/started.json", prefix), r#"{"timestamp": 1}"#);
        let fake = Arc::new(objects);
        let resolver = StorageBuildResolver::new(fake.clone(), "test-platform-results", BROWSE);

        let location = StorageLocation::new("origin-ci-test", prefix);
        let job: JobName = "pull-ci-org-repo-master-e2e".parse().unwrap();
        let record = resolver.resolve_at(&job, BUILD, location).await.unwrap();

        assert_eq!(record.outcome, BuildOutcome::Failure);
        assert!(
            fake.requested
                .lock()
                .unwrap()
                .iter()
                .all(|o| o.starts_with("origin-ci-test/pr-logs/"))
        );
    }
}
