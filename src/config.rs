//! Gitflow configuration.
//!
//! Branch names, prefixes and policies are read from `.gitflow.toml` in the
//! repository root. Every key is optional; a missing file means defaults.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the repository root
pub const CONFIG_FILE_NAME: &str = ".gitflow.toml";

/// What an action does when a branch it depends on has no record yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRecordPolicy {
    /// Create an empty record silently
    Create,
    /// Create an empty record and log a warning
    #[default]
    Warn,
    /// Refuse to run the action
    Reject,
}

/// Classification of a branch by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    /// The production branch
    Master,
    /// The integration branch
    Develop,
    /// A release branch
    Release,
    /// A hotfix branch
    Hotfix,
    /// A feature branch
    Feature,
    /// Anything else
    Unknown,
}

impl BranchType {
    /// Lower-case name exported as `GIT_BRANCH_TYPE`
    pub fn as_str(self) -> &'static str {
        match self {
            BranchType::Master => "master",
            BranchType::Develop => "develop",
            BranchType::Release => "release",
            BranchType::Hotfix => "hotfix",
            BranchType::Feature => "feature",
            BranchType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gitflow settings for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitflowConfig {
    /// Remote the Gitflow branches live on
    pub remote: String,
    /// Production branch
    pub master_branch: String,
    /// Integration branch
    pub develop_branch: String,
    /// Prefix of release branches
    pub release_branch_prefix: String,
    /// Prefix of hotfix branches
    pub hotfix_branch_prefix: String,
    /// Prefix of feature branches
    pub feature_branch_prefix: String,
    /// Prefix of release version tags
    pub version_tag_prefix: String,
    /// Downgrade successful builds to unstable while recorded branches are broken
    pub mark_successful_build_unstable_on_broken_branches: bool,
    /// Handling of prerequisite branches without a record
    pub missing_record_policy: MissingRecordPolicy,
    /// Directory for the build history, relative to the repository root
    pub state_dir: PathBuf,
    /// Days a soft-removed branch record is kept before it is erased
    pub tombstone_retention_days: u32,
}

impl Default for GitflowConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            master_branch: "master".to_string(),
            develop_branch: "develop".to_string(),
            release_branch_prefix: "release/".to_string(),
            hotfix_branch_prefix: "hotfix/".to_string(),
            feature_branch_prefix: "feature/".to_string(),
            version_tag_prefix: "v".to_string(),
            mark_successful_build_unstable_on_broken_branches: true,
            missing_record_policy: MissingRecordPolicy::default(),
            state_dir: PathBuf::from(".gitflow"),
            tombstone_retention_days: 30,
        }
    }
}

impl GitflowConfig {
    /// Load configuration from a file; a missing file yields the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.gitflow.toml` from a repository root
    pub fn load_from_repo(repo: &Path) -> Result<Self> {
        Self::load_from_file(&repo.join(CONFIG_FILE_NAME))
    }

    /// Reject settings the actions cannot work with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("remote", &self.remote),
            ("master_branch", &self.master_branch),
            ("develop_branch", &self.develop_branch),
            ("release_branch_prefix", &self.release_branch_prefix),
            ("hotfix_branch_prefix", &self.hotfix_branch_prefix),
            ("feature_branch_prefix", &self.feature_branch_prefix),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }

        if self.master_branch == self.develop_branch {
            return Err(ConfigError::InvalidValue {
                key: "develop_branch".to_string(),
                reason: format!("must differ from master_branch '{}'", self.master_branch),
            }
            .into());
        }

        Ok(())
    }

    /// Classify a branch by name
    pub fn branch_type(&self, branch_name: &str) -> BranchType {
        if branch_name == self.master_branch {
            BranchType::Master
        } else if branch_name == self.develop_branch {
            BranchType::Develop
        } else if branch_name.starts_with(&self.release_branch_prefix) {
            BranchType::Release
        } else if branch_name.starts_with(&self.hotfix_branch_prefix) {
            BranchType::Hotfix
        } else if branch_name.starts_with(&self.feature_branch_prefix) {
            BranchType::Feature
        } else {
            BranchType::Unknown
        }
    }

    /// Release branch for a version: `1.0` -> `release/1.0`
    pub fn release_branch(&self, version: &str) -> String {
        format!("{}{}", self.release_branch_prefix, version)
    }

    /// Hotfix branch for a version: `1.0` -> `hotfix/1.0`
    pub fn hotfix_branch(&self, version: &str) -> String {
        format!("{}{}", self.hotfix_branch_prefix, version)
    }

    /// Feature branch for a name; names that already carry the prefix are kept
    pub fn feature_branch(&self, feature_name: &str) -> String {
        if feature_name.starts_with(&self.feature_branch_prefix) {
            feature_name.to_string()
        } else {
            format!("{}{}", self.feature_branch_prefix, feature_name)
        }
    }

    /// Tag for a release version: `1.0` -> `v1.0`
    pub fn version_tag(&self, version: &str) -> String {
        format!("{}{}", self.version_tag_prefix, version)
    }

    /// Remote-qualified branch name: `develop` -> `origin/develop`
    pub fn remote_branch(&self, branch_name: &str) -> String {
        format!("{}/{}", self.remote, branch_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = GitflowConfig::load_from_repo(temp_dir.path()).expect("load");
        assert_eq!(config, GitflowConfig::default());
        assert_eq!(config.missing_record_policy, MissingRecordPolicy::Warn);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "master_branch = \"main\"\nmissing_record_policy = \"reject\"\n",
        )
        .unwrap();

        let config = GitflowConfig::load_from_repo(temp_dir.path()).expect("load");
        assert_eq!(config.master_branch, "main");
        assert_eq!(config.develop_branch, "develop");
        assert_eq!(config.missing_record_policy, MissingRecordPolicy::Reject);
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let config = GitflowConfig {
            release_branch_prefix: String::new(),
            ..GitflowConfig::default()
        };
        let err = config.validate().expect_err("empty prefix");
        assert!(err.to_string().contains("release_branch_prefix"));
    }

    #[test]
    fn test_branch_type() {
        let config = GitflowConfig::default();
        assert_eq!(config.branch_type("master"), BranchType::Master);
        assert_eq!(config.branch_type("develop"), BranchType::Develop);
        assert_eq!(config.branch_type("release/1.0"), BranchType::Release);
        assert_eq!(config.branch_type("hotfix/1.0"), BranchType::Hotfix);
        assert_eq!(config.branch_type("feature/login"), BranchType::Feature);
        assert_eq!(config.branch_type("bugfix/x"), BranchType::Unknown);
    }

    #[test]
    fn test_branch_names() {
        let config = GitflowConfig::default();
        assert_eq!(config.release_branch("1.0.0"), "release/1.0.0");
        assert_eq!(config.feature_branch("login"), "feature/login");
        assert_eq!(config.feature_branch("feature/login"), "feature/login");
        assert_eq!(config.version_tag("1.0.0"), "v1.0.0");
        assert_eq!(config.remote_branch("develop"), "origin/develop");
    }
}
