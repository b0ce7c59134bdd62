//! The build run an action executes in.
//!
//! A [`Build`] is the persisted result of one invocation: its number, the
//! badge of the action that produced it, the terminal result, the
//! environment handed to the main build command and the branch record store
//! as it was when the run ended.

mod history;

pub use history::{BuildHistory, FileBuildHistory};

use crate::data::{BranchRecordStore, BuildResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variables accumulated for the main build
pub type EnvVarMap = BTreeMap<String, String>;

/// Marker naming the Gitflow action that produced a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitflowBadge {
    /// Display name of the action, e.g. `Start Release`
    pub action_name: String,
}

/// One build run and its persisted outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    /// Sequential build number, starting at 1
    pub number: u64,
    /// Badge registered by the action, if any
    #[serde(default)]
    pub badge: Option<GitflowBadge>,
    /// Terminal result; unset while the build is still considered successful
    #[serde(default)]
    pub result: Option<BuildResult>,
    /// Environment variables the action exported
    #[serde(default)]
    pub env_vars: EnvVarMap,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run was persisted
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Branch record store attached at the end of the run
    #[serde(default)]
    pub gitflow_data: Option<BranchRecordStore>,
}

impl Build {
    /// Start a new build run
    pub fn new(number: u64) -> Self {
        Self {
            number,
            badge: None,
            result: None,
            env_vars: EnvVarMap::new(),
            started_at: Utc::now(),
            finished_at: None,
            gitflow_data: None,
        }
    }

    /// Result of the build, treating an unset result as success
    pub fn result_non_null(&self) -> BuildResult {
        self.result.unwrap_or(BuildResult::Success)
    }

    /// Overwrite the result
    pub fn set_result(&mut self, result: BuildResult) {
        self.result = Some(result);
    }

    /// Register the badge of the action running in this build
    pub fn add_badge(&mut self, action_name: &str) {
        self.badge = Some(GitflowBadge {
            action_name: action_name.to_string(),
        });
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_non_null_defaults_to_success() {
        let mut build = Build::new(1);
        assert_eq!(build.result_non_null(), BuildResult::Success);

        build.set_result(BuildResult::Failure);
        assert_eq!(build.result_non_null(), BuildResult::Failure);
    }

    #[test]
    fn test_build_json_without_store() {
        let json = r#"{"number": 4, "started_at": "2024-05-01T10:00:00Z", "result": "UNSTABLE"}"#;
        let build: Build = serde_json::from_str(json).expect("deserialize");
        assert_eq!(build.number, 4);
        assert_eq!(build.result, Some(BuildResult::Unstable));
        assert!(build.gitflow_data.is_none());
        assert!(build.env_vars.is_empty());
    }
}
