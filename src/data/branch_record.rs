//! Per-branch build state recorded across build runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal result of a build, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    /// Build succeeded
    Success,
    /// Build succeeded but tests or checks were unstable
    Unstable,
    /// Build failed
    Failure,
    /// Build was not executed
    NotBuilt,
    /// Build was aborted
    Aborted,
}

impl BuildResult {
    /// Strictly better than `other`
    pub fn is_better_than(self, other: BuildResult) -> bool {
        self < other
    }

    /// Strictly worse than `other`
    pub fn is_worse_than(self, other: BuildResult) -> bool {
        self > other
    }

    /// Upper-case name as shown in console messages
    pub fn as_str(self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildResult {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SUCCESS" => Ok(BuildResult::Success),
            "UNSTABLE" => Ok(BuildResult::Unstable),
            "FAILURE" => Ok(BuildResult::Failure),
            "NOT_BUILT" => Ok(BuildResult::NotBuilt),
            "ABORTED" => Ok(BuildResult::Aborted),
            other => Err(format!("unknown build result '{other}'")),
        }
    }
}

/// Remote alias used when none is given
pub const DEFAULT_REMOTE_ALIAS: &str = "origin";

/// State snapshot for one tracked remote branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    branch_name: String,
    /// Remote the branch lives on
    #[serde(default = "default_remote_alias")]
    pub remote_alias: String,
    /// Result of the last build of this branch (unset if never built)
    #[serde(default)]
    pub last_build_result: Option<BuildResult>,
    /// Version the project files had in the last build
    #[serde(default)]
    pub last_build_version: Option<String>,
    /// Most recent release version built on this branch
    #[serde(default)]
    pub last_release_version: Option<String>,
    /// Release version this branch line originates from
    #[serde(default)]
    pub base_release_version: Option<String>,
    /// Commit the last release version tag points at
    #[serde(default)]
    pub last_release_version_commit: Option<String>,
    /// Set when the record was soft-removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) removed_at: Option<DateTime<Utc>>,
}

fn default_remote_alias() -> String {
    DEFAULT_REMOTE_ALIAS.to_string()
}

impl BranchRecord {
    /// Create an empty record for a branch on the default remote
    pub fn new(branch_name: impl Into<String>) -> Self {
        Self::with_remote(DEFAULT_REMOTE_ALIAS, branch_name)
    }

    /// Create an empty record for a branch on the given remote
    pub fn with_remote(remote_alias: impl Into<String>, branch_name: impl Into<String>) -> Self {
        Self {
            branch_name: branch_name.into(),
            remote_alias: remote_alias.into(),
            last_build_result: None,
            last_build_version: None,
            last_release_version: None,
            base_release_version: None,
            last_release_version_commit: None,
            removed_at: None,
        }
    }

    /// Name of the branch, e.g. `release/1.0`
    pub fn branch_name(&self) -> &str {
        &self.branch_name
    }

    /// Whether the record was soft-removed
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    /// When the record was soft-removed
    pub fn removed_at(&self) -> Option<DateTime<Utc>> {
        self.removed_at
    }

    /// Whether the last recorded build succeeded
    pub fn is_successful(&self) -> bool {
        self.last_build_result == Some(BuildResult::Success)
    }
}

impl fmt::Display for BranchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.branch_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ordering() {
        assert!(BuildResult::Success.is_better_than(BuildResult::Unstable));
        assert!(BuildResult::Failure.is_worse_than(BuildResult::Unstable));
        assert!(!BuildResult::Unstable.is_better_than(BuildResult::Unstable));
        assert!(!BuildResult::Unstable.is_worse_than(BuildResult::Unstable));
        assert!(BuildResult::Aborted.is_worse_than(BuildResult::NotBuilt));
    }

    #[test]
    fn test_result_parse() {
        assert_eq!("success".parse::<BuildResult>(), Ok(BuildResult::Success));
        assert_eq!("not-built".parse::<BuildResult>(), Ok(BuildResult::NotBuilt));
        assert!("green".parse::<BuildResult>().is_err());
    }

    #[test]
    fn test_result_serde_names() {
        let json = serde_json::to_string(&BuildResult::NotBuilt).expect("serialize");
        assert_eq!(json, "\"NOT_BUILT\"");
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = BranchRecord::new("develop");
        assert_eq!(record.branch_name(), "develop");
        assert_eq!(record.remote_alias, "origin");
        assert_eq!(record.last_build_result, None);
        assert_eq!(record.last_build_version, None);
        assert!(!record.is_removed());
        assert!(!record.is_successful());
    }
}
