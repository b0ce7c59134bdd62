//! Causes: the read-only input of an action run.

use crate::error::Result;
use crate::version::numbers;
use std::fmt;

/// Which kind of release line a test, publish or finish action works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    /// `release/*` branches, cut from develop
    Release,
    /// `hotfix/*` branches, cut from master
    Hotfix,
}

impl ReleaseKind {
    /// Lower-case word used in messages
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseKind::Release => "release",
            ReleaseKind::Hotfix => "hotfix",
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of a Start Release run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReleaseCause {
    /// Version of the new release, e.g. `1.0.0`
    pub release_version: String,
    /// Development version for fixes on the release branch
    pub release_next_development_version: String,
    /// Development version for develop after the release branch is cut
    pub next_development_version: String,
    /// Rehearse without pushing
    pub dry_run: bool,
}

impl StartReleaseCause {
    /// Cause for `release_version` with the follow-up versions derived from it
    pub fn new(release_version: &str) -> Result<Self> {
        Ok(Self {
            release_version: release_version.to_string(),
            release_next_development_version: numbers::fixes_development_version(
                release_version,
            )?,
            next_development_version: numbers::next_minor_development_version(release_version)?,
            dry_run: false,
        })
    }
}

/// Input of a Start Hotfix run
///
/// Versions that are not given are derived from the master branch record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartHotfixCause {
    /// Release line the hotfix branch is named after, e.g. `1.0`
    pub hotfix_version: Option<String>,
    /// Development version on the hotfix branch, e.g. `1.0.2-SNAPSHOT`
    pub next_patch_development_version: Option<String>,
    /// Rehearse without pushing
    pub dry_run: bool,
}

/// Input of a Test Release or Test Hotfix run
///
/// Versions that are not given are derived from the branch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCause {
    /// Release or hotfix branch to test
    pub branch: String,
    /// Version the branch is built and tagged with
    pub patch_version: Option<String>,
    /// Development version after the patch release
    pub next_patch_development_version: Option<String>,
    /// Rehearse without pushing
    pub dry_run: bool,
}

impl TestCause {
    /// Cause with derived versions
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            patch_version: None,
            next_patch_development_version: None,
            dry_run: false,
        }
    }
}

/// Input of the actions that only need a branch name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCause {
    /// Branch the action works on
    pub branch: String,
    /// Rehearse without pushing
    pub dry_run: bool,
}

impl BranchCause {
    /// Cause for `branch`
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_release_cause_derives_versions() {
        let cause = StartReleaseCause::new("1.1.0").unwrap();
        assert_eq!(cause.release_next_development_version, "1.1.1-SNAPSHOT");
        assert_eq!(cause.next_development_version, "1.2.0-SNAPSHOT");
        assert!(!cause.dry_run);
    }

    #[test]
    fn test_start_release_cause_rejects_garbage() {
        assert!(StartReleaseCause::new("next").is_err());
    }
}
