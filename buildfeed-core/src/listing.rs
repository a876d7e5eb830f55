//! Job-history listing parsing
//!
//! Pure functions over the job-history URL and the HTML page it serves. No
//! I/O happens here; fetching the page is the client's job.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

use crate::domain::job::{BuildId, JobName};

/// Shortest digit run treated as a build ID
///
/// Page indices, timestamps in seconds and PR numbers are all shorter.
pub const MIN_BUILD_ID_DIGITS: usize = 15;

static BUILD_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b[0-9]{{{},}}\b", MIN_BUILD_ID_DIGITS))
        .expect("build id pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("malformed job URL {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },
}

impl ListingError {
    fn malformed(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Extracts the job name from a job-history URL
///
/// The job name is the last non-empty path segment, so
/// `https://prow.example.com/job-history/bucket/logs/periodic-e2e/` yields
/// `periodic-e2e`.
pub fn parse_job_name(job_url: &str) -> Result<JobName, ListingError> {
    let url = Url::parse(job_url.trim())
        .map_err(|e| ListingError::malformed(job_url, e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ListingError::malformed(
            job_url,
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }

    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| ListingError::malformed(job_url, "no path segments"))?;

    segment
        .parse::<JobName>()
        .map_err(|e| ListingError::malformed(job_url, e.to_string()))
}

/// Extracts candidate build IDs from a job-history page
///
/// IDs come back in order of first appearance with later duplicates
/// dropped. Tokens that are not a canonical [`BuildId`] (leading zero, too
/// large) are skipped. A page without any build is a normal result, not an
/// error.
pub fn extract_build_ids(html: &str) -> Vec<BuildId> {
    let mut seen = HashSet::new();

    BUILD_ID_PATTERN
        .find_iter(html)
        .filter_map(|m| m.as_str().parse::<BuildId>().ok())
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_name() {
        let name = parse_job_name(
            "https://prow.ci.openshift.org/job-history/test-platform-results/logs/periodic-ci-codeready-toolchain-toolchain-e2e-master-ci-daily",
        )
        .unwrap();
        assert_eq!(
            name.as_str(),
            "periodic-ci-codeready-toolchain-toolchain-e2e-master-ci-daily"
        );
    }

    #[test]
    fn test_parse_job_name_ignores_trailing_slash_and_query() {
        let url = "https://prow.example.com/job-history/gs/bucket/logs/e2e-job/?buildId=1";
        let name = parse_job_name(url).unwrap();
        assert_eq!(name.as_str(), "e2e-job");
    }

    #[test]
    fn test_parse_job_name_without_path_is_malformed() {
        for url in [
            "https://prow.example.com",
            "https://prow.example.com/",
            "https://prow.example.com//",
        ] {
            assert!(
                matches!(parse_job_name(url), Err(ListingError::MalformedUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_job_name_rejects_garbage() {
        assert!(parse_job_name("not a url").is_err());
        assert!(parse_job_name("ftp://host/job").is_err());
        assert!(parse_job_name("").is_err());
    }

    #[test]
    fn test_extract_build_ids_stable_dedup() {
        let html = r#"
            <tr><td><a href="/view/gs/b/logs/job/300000000000001">300000000000001</a></td></tr>
            <tr><td><a href="/view/gs/b/logs/job/300000000000002">300000000000002</a></td></tr>
            <tr><td>300000000000001</td></tr>
        "#;

        assert_eq!(
            extract_build_ids(html),
            vec![BuildId::new(300000000000001), BuildId::new(300000000000002)]
        );
    }

    #[test]
    fn test_extract_build_ids_keeps_listing_order() {
        let html = "1900000000000000003 1800000000000000002 1900000000000000001";

        assert_eq!(
            extract_build_ids(html),
            vec![
                BuildId::new(1900000000000000003),
                BuildId::new(1800000000000000002),
                BuildId::new(1900000000000000001),
            ]
        );
    }

    #[test]
    fn test_extract_build_ids_skips_short_numbers() {
        let html = r#"
            <a href="?page=2">2</a> <span>1678886400</span>
            <td>12345678901234</td> 123456789012345
        "#;

        assert_eq!(extract_build_ids(html), vec![BuildId::new(123456789012345)]);
    }

    #[test]
    fn test_extract_build_ids_requires_word_boundaries() {
        let html = "build1234567890123456 1234567890123456x 1234567890123456";

        assert_eq!(extract_build_ids(html), vec![BuildId::new(1234567890123456)]);
    }

    #[test]
    fn test_extract_build_ids_skips_overflowing_numbers() {
        let html = "123456789012345678901234567890 1891795860363153408";

        assert_eq!(extract_build_ids(html), vec![BuildId::new(1891795860363153408)]);
    }

    #[test]
    fn test_extract_build_ids_skips_leading_zeros() {
        let html = "0300000000000001 300000000000001";

        assert_eq!(extract_build_ids(html), vec![BuildId::new(300000000000001)]);
    }

    #[test]
    fn test_extract_build_ids_empty_page() {
        assert!(extract_build_ids("").is_empty());
        assert!(extract_build_ids("<html><body>No builds yet</body></html>").is_empty());
    }
}
