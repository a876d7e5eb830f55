//! Ingestion API DTOs
//!
//! Payloads of the analytics platform's CI build import endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::build::{BuildOutcome, BuildRecord};
use crate::domain::job::BuildId;

/// Origin tag attached to every imported build
pub const ORIGIN: &str = "OpenShift_CI";

const STATUS_COMPLETED: &str = "Completed";

/// A build record cannot be turned into an import payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("build {0} has no definitive outcome")]
    UnresolvedOutcome(BuildId),
}

/// Repository registered with the analytics platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
}

/// Identity of whoever triggered the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredByPayload {
    pub name: String,
    pub email: String,
    pub account_id: String,
    pub last_activity: i64,
}

/// Import payload for one CI build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiBuildPayload {
    pub origin: String,
    #[serde(rename = "originalID")]
    pub original_id: String,
    pub name: String,
    pub url: String,
    pub started_at: i64,
    pub created_at: i64,
    pub completed_at: i64,
    pub triggered_by: TriggeredByPayload,
    pub status: String,
    pub conclusion: String,
    pub repo_url: String,
    pub commit: String,
    pub pull_request_urls: Vec<String>,
    pub is_deployment: bool,
    pub stages: Vec<StagePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePayload {
    pub name: String,
    pub id: String,
    pub url: String,
    pub started_at: i64,
    pub completed_at: i64,
    pub status: String,
    pub conclusion: String,
    pub jobs: Vec<JobPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub name: String,
    pub started_at: i64,
    pub completed_at: i64,
    pub status: String,
    pub conclusion: String,
}

impl TryFrom<&BuildRecord> for CiBuildPayload {
    type Error = RecordError;

    fn try_from(record: &BuildRecord) -> Result<Self, Self::Error> {
        let conclusion = match record.outcome {
            BuildOutcome::Success => "Success",
            BuildOutcome::Failure => "Failure",
            BuildOutcome::Unknown => return Err(RecordError::UnresolvedOutcome(record.build_id)),
        }
        .to_string();

        let started_at = record.started_at.map(|t| t.timestamp()).unwrap_or(0);
        let completed_at = record.finished_at.map(|t| t.timestamp()).unwrap_or(0);
        let original_id = record.build_id.to_string();

        let job = JobPayload {
            name: record.display_name.clone(),
            started_at,
            completed_at,
            status: STATUS_COMPLETED.to_string(),
            conclusion: conclusion.clone(),
        };

        let stage = StagePayload {
            name: record.display_name.clone(),
            id: original_id.clone(),
            url: record.details_url.clone(),
            started_at,
            completed_at,
            status: STATUS_COMPLETED.to_string(),
            conclusion: conclusion.clone(),
            jobs: vec![job],
        };

        Ok(Self {
            origin: ORIGIN.to_string(),
            original_id,
            name: record.display_name.clone(),
            url: record.details_url.clone(),
            started_at,
            created_at: started_at,
            completed_at,
            triggered_by: TriggeredByPayload {
                name: record.triggered_by.name.clone(),
                email: record.triggered_by.email.clone(),
                account_id: record.triggered_by.account_id.clone(),
                last_activity: 1,
            },
            status: STATUS_COMPLETED.to_string(),
            conclusion,
            repo_url: record.repo_url(),
            commit: record.commit_sha.clone(),
            pull_request_urls: vec![record.details_url.clone()],
            is_deployment: true,
            stages: vec![stage],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::build::TriggeredBy;
    use crate::domain::location::StorageLocation;
    use chrono::DateTime;

    fn record(outcome: BuildOutcome) -> BuildRecord {
        BuildRecord {
            job_name: "pull-ci-repo-name-job-name".parse().unwrap(),
            build_id: BuildId::new(456),
            outcome,
            started_at: DateTime::from_timestamp(1678886300, 0),
            finished_at: DateTime::from_timestamp(1678886400, 0),
            location: StorageLocation::new("test-platform-results", "pr-logs/pull/123/job/456"),
            details_url: "https://gcsweb/gs/test-platform-results/pr-logs/pull/123/job/456"
                .to_string(),
            repo_full_name: "openshift/repo-name".to_string(),
            commit_sha: "abcdef123456".to_string(),
            triggered_by: TriggeredBy {
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
                account_id: "testuser".to_string(),
            },
            display_name: "OpenShift CI 123".to_string(),
        }
    }

    #[test]
    fn test_payload_wire_format() {
        let payload = CiBuildPayload::try_from(&record(BuildOutcome::Success)).unwrap();
        let url = "https://gcsweb/gs/test-platform-results/pr-logs/pull/123/job/456";

        let expected = serde_json::json!({
            "origin": "OpenShift_CI",
            "originalID": "456",
            "name": "OpenShift CI 123",
            "url": url,
            "startedAt": 1678886300,
            "createdAt": 1678886300,
            "completedAt": 1678886400,
            "triggeredBy": {
                "name": "Test User",
                "email": "test@example.com",
                "accountId": "testuser",
                "lastActivity": 1
            },
            "status": "Completed",
            "conclusion": "Success",
            "repoUrl": "https://github.com/openshift/repo-name",
            "commit": "abcdef123456",
            "pullRequestUrls": [url],
            "isDeployment": true,
            "stages": [{
                "name": "OpenShift CI 123",
                "id": "456",
                "url": url,
                "startedAt": 1678886300,
                "completedAt": 1678886400,
                "status": "Completed",
                "conclusion": "Success",
                "jobs": [{
                    "name": "OpenShift CI 123",
                    "startedAt": 1678886300,
                    "completedAt": 1678886400,
                    "status": "Completed",
                    "conclusion": "Success"
                }]
            }]
        });

        assert_eq!(serde_json::to_value(&payload).unwrap(), expected);
    }

    #[test]
    fn test_failure_conclusion_and_missing_timestamps() {
        let mut failed = record(BuildOutcome::Failure);
        failed.started_at = None;

        let payload = CiBuildPayload::try_from(&failed).unwrap();
        assert_eq!(payload.conclusion, "Failure");
        assert_eq!(payload.stages[0].jobs[0].conclusion, "Failure");
        assert_eq!(payload.started_at, 0);
        assert_eq!(payload.created_at, 0);
    }

    #[test]
    fn test_unknown_outcome_is_rejected() {
        let err = CiBuildPayload::try_from(&record(BuildOutcome::Unknown)).unwrap_err();
        assert_eq!(err, RecordError::UnresolvedOutcome(BuildId::new(456)));
    }
}
