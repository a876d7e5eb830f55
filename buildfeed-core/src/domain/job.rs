//! Job and build identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid job name: {0:?}")]
    InvalidJobName(String),

    #[error("invalid build id: {0:?}")]
    InvalidBuildId(String),
}

/// Name of a CI job
///
/// Taken from the trailing path segment of a job-history URL. It keys the
/// tracker artifact and is used as a path component in object storage, so it
/// can never contain a path separator or be a relative path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dash-separated token of the name, e.g. `daily` for
    /// `periodic-ci-toolchain-e2e-daily`
    pub fn short_name(&self) -> &str {
        self.0.rsplit('-').next().unwrap_or(&self.0)
    }
}

impl FromStr for JobName {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s != "."
            && s != ".."
            && !s.contains(['/', '\\'])
            && !s.chars().any(char::is_control);

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(IdError::InvalidJobName(s.to_string()))
        }
    }
}

impl TryFrom<String> for JobName {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobName> for String {
    fn from(name: JobName) -> Self {
        name.0
    }
}

impl AsRef<str> for JobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one build run within a job
///
/// Minted by the upstream CI system as a long decimal number (commonly 19
/// digits). Only the canonical spelling parses, so a leading zero is
/// rejected and every ID maps back to the exact storage path it came from.
/// Numeric order carries no meaning for this crate; listing order is the
/// only ordering contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(u64);

impl BuildId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for BuildId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && !(s.len() > 1 && s.starts_with('0'));
        if !canonical {
            return Err(IdError::InvalidBuildId(s.to_string()));
        }

        s.parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::InvalidBuildId(s.to_string()))
    }
}

impl From<u64> for BuildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
