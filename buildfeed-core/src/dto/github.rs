//! GitHub REST API DTOs
//!
//! Only the fields read by the pull-request backfill are modelled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: GitRef,
    #[serde(default)]
    pub user: Option<GithubUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Combined status of a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub statuses: Vec<CommitStatus>,
}

impl CombinedStatus {
    /// First status whose context starts with `prefix`
    pub fn find_context(&self, prefix: &str) -> Option<&CommitStatus> {
        self.statuses.iter().find(|s| s.context.starts_with(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub context: String,
    pub state: String,
    #[serde(default)]
    pub target_url: Option<String>,
}

impl CommitStatus {
    /// Whether the status reached a terminal success or failure state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state.as_str(), "success" | "failure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_context_by_prefix() {
        let status: CombinedStatus = serde_json::from_value(serde_json::json!({
            "state": "failure",
            "statuses": [
                {"context": "ci/prow/lint", "state": "success", "target_url": "https://a"},
                {"context": "ci/prow/e2e-gcp", "state": "failure", "target_url": "https://b"},
                {"context": "ci/prow/e2e", "state": "success"}
            ]
        }))
        .unwrap();

        let found = status.find_context("ci/prow/e2e").unwrap();
        assert_eq!(found.target_url.as_deref(), Some("https://b"));
        assert!(found.is_terminal());
        assert!(status.find_context("tide").is_none());
    }

    #[test]
    fn test_pending_is_not_terminal() {
        let status = CommitStatus {
            context: "ci/prow/e2e".to_string(),
            state: "pending".to_string(),
            target_url: None,
        };
        assert!(!status.is_terminal());
    }
}
