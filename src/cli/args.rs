//! Command line argument parsing and validation.
//!
//! Every Gitflow action is a subcommand. Actions that build something take the
//! main build command after `--`:
//!
//! ```text
//! kodegen_gitflow start-release --release-version 1.0.0 -- cargo test --workspace
//! ```

use crate::action::{
    Action, BranchBuildAction, BranchCause, FinishAction, FinishFeatureAction, PublishAction,
    StartFeatureAction, StartHotfixAction, StartHotfixCause, StartReleaseAction,
    StartReleaseCause, TestAction, TestCause,
};
use crate::config::{CONFIG_FILE_NAME, GitflowConfig};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gitflow actions around a build command
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_gitflow",
    version,
    about = "Gitflow actions around a build command",
    long_about = "Run Gitflow release, hotfix and feature transitions around a build command.

Each invocation is one build run. Branch results and versions are recorded in the
build history so later runs know which branches are broken.

Usage:
  kodegen_gitflow build-branch --branch develop -- cargo test
  kodegen_gitflow start-release --release-version 1.0.0 -- cargo test
  kodegen_gitflow --dry-run start-hotfix
  kodegen_gitflow status"
)]
pub struct Args {
    /// Working copy of the repository
    #[arg(long, global = true, default_value = ".", env = "GITFLOW_REPO")]
    pub repo: PathBuf,

    /// Configuration file (default: <repo>/.gitflow.toml)
    #[arg(long, global = true, env = "GITFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Rehearse the action without pushing anything
    #[arg(long, global = true, env = "GITFLOW_DRY_RUN")]
    pub dry_run: bool,

    /// Print the build environment and other details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Action to run
    #[command(subcommand)]
    pub command: Command,
}

/// Main build command given after `--`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct MainBuild {
    /// Command executed as the main build
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Gitflow actions
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Cut a release branch from develop
    StartRelease {
        /// Version of the new release
        #[arg(long)]
        release_version: String,
        /// Development version for fixes on the release branch
        #[arg(long)]
        release_next_development_version: Option<String>,
        /// Development version for develop
        #[arg(long)]
        next_development_version: Option<String>,
        /// Main build command
        #[command(flatten)]
        main_build: MainBuild,
    },

    /// Build, tag and bump a release branch
    TestRelease {
        /// Release branch to test
        #[arg(long)]
        branch: String,
        /// Version to build and tag
        #[arg(long)]
        patch_version: Option<String>,
        /// Development version after the patch release
        #[arg(long)]
        next_patch_development_version: Option<String>,
        /// Main build command
        #[command(flatten)]
        main_build: MainBuild,
    },

    /// Merge the last tested release into master
    PublishRelease {
        /// Release branch to publish
        #[arg(long)]
        branch: String,
    },

    /// Delete a release branch
    FinishRelease {
        /// Release branch to delete
        #[arg(long)]
        branch: String,
    },

    /// Cut a hotfix branch from master
    StartHotfix {
        /// Release line to fix (default: base release version of master)
        #[arg(long)]
        hotfix_version: Option<String>,
        /// Development version on the hotfix branch
        #[arg(long)]
        next_patch_development_version: Option<String>,
    },

    /// Build, tag and bump a hotfix branch
    TestHotfix {
        /// Hotfix branch to test
        #[arg(long)]
        branch: String,
        /// Version to build and tag
        #[arg(long)]
        patch_version: Option<String>,
        /// Development version after the patch release
        #[arg(long)]
        next_patch_development_version: Option<String>,
        /// Main build command
        #[command(flatten)]
        main_build: MainBuild,
    },

    /// Merge the last tested hotfix into master
    PublishHotfix {
        /// Hotfix branch to publish
        #[arg(long)]
        branch: String,
    },

    /// Delete a hotfix branch
    FinishHotfix {
        /// Hotfix branch to delete
        #[arg(long)]
        branch: String,
    },

    /// Cut a feature branch from develop
    StartFeature {
        /// Feature name, with or without the feature prefix
        #[arg(long)]
        feature: String,
        /// Main build command
        #[command(flatten)]
        main_build: MainBuild,
    },

    /// Merge a feature branch into develop
    FinishFeature {
        /// Feature name, with or without the feature prefix
        #[arg(long)]
        feature: String,
        /// Main build command
        #[command(flatten)]
        main_build: MainBuild,
    },

    /// Build a branch and record its result
    BuildBranch {
        /// Branch to build
        #[arg(long)]
        branch: String,
        /// Main build command
        #[command(flatten)]
        main_build: MainBuild,
    },

    /// Show the branch records of the latest build
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartRelease { .. } => "start-release",
            Command::TestRelease { .. } => "test-release",
            Command::PublishRelease { .. } => "publish-release",
            Command::FinishRelease { .. } => "finish-release",
            Command::StartHotfix { .. } => "start-hotfix",
            Command::TestHotfix { .. } => "test-hotfix",
            Command::PublishHotfix { .. } => "publish-hotfix",
            Command::FinishHotfix { .. } => "finish-hotfix",
            Command::StartFeature { .. } => "start-feature",
            Command::FinishFeature { .. } => "finish-feature",
            Command::BuildBranch { .. } => "build-branch",
            Command::Status { .. } => "status",
        }
    }

    /// Main build command, empty when none was given or the action has none
    pub fn main_build(&self) -> &[String] {
        match self {
            Command::StartRelease { main_build, .. }
            | Command::TestRelease { main_build, .. }
            | Command::TestHotfix { main_build, .. }
            | Command::StartFeature { main_build, .. }
            | Command::FinishFeature { main_build, .. }
            | Command::BuildBranch { main_build, .. } => &main_build.command,
            _ => &[],
        }
    }

    /// Gitflow action for this subcommand, `None` for `status`
    pub fn to_action(&self, dry_run: bool) -> Result<Option<Action>> {
        let branch_cause = |branch: &str| BranchCause {
            branch: branch.to_string(),
            dry_run,
        };
        let test_cause = |branch: &str,
                          patch_version: &Option<String>,
                          next_patch_development_version: &Option<String>| TestCause {
            branch: branch.to_string(),
            patch_version: patch_version.clone(),
            next_patch_development_version: next_patch_development_version.clone(),
            dry_run,
        };

        let action = match self {
            Command::StartRelease {
                release_version,
                release_next_development_version,
                next_development_version,
                ..
            } => {
                let mut cause = StartReleaseCause::new(release_version)?;
                if let Some(version) = release_next_development_version {
                    cause.release_next_development_version = version.clone();
                }
                if let Some(version) = next_development_version {
                    cause.next_development_version = version.clone();
                }
                cause.dry_run = dry_run;
                Action::StartRelease(StartReleaseAction::new(cause))
            }
            Command::TestRelease {
                branch,
                patch_version,
                next_patch_development_version,
                ..
            } => Action::Test(TestAction::release(test_cause(
                branch,
                patch_version,
                next_patch_development_version,
            ))),
            Command::PublishRelease { branch } => {
                Action::Publish(PublishAction::release(branch_cause(branch)))
            }
            Command::FinishRelease { branch } => {
                Action::Finish(FinishAction::release(branch_cause(branch)))
            }
            Command::StartHotfix {
                hotfix_version,
                next_patch_development_version,
            } => Action::StartHotfix(StartHotfixAction::new(StartHotfixCause {
                hotfix_version: hotfix_version.clone(),
                next_patch_development_version: next_patch_development_version.clone(),
                dry_run,
            })),
            Command::TestHotfix {
                branch,
                patch_version,
                next_patch_development_version,
                ..
            } => Action::Test(TestAction::hotfix(test_cause(
                branch,
                patch_version,
                next_patch_development_version,
            ))),
            Command::PublishHotfix { branch } => {
                Action::Publish(PublishAction::hotfix(branch_cause(branch)))
            }
            Command::FinishHotfix { branch } => {
                Action::Finish(FinishAction::hotfix(branch_cause(branch)))
            }
            Command::StartFeature { feature, .. } => {
                Action::StartFeature(StartFeatureAction::new(branch_cause(feature)))
            }
            Command::FinishFeature { feature, .. } => {
                Action::FinishFeature(FinishFeatureAction::new(branch_cause(feature)))
            }
            Command::BuildBranch { branch, .. } => {
                Action::BranchBuild(BranchBuildAction::new(branch_cause(branch)))
            }
            Command::Status { .. } => return Ok(None),
        };
        Ok(Some(action))
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.repo.is_dir() {
            return Err(format!("Repository path {} is not a directory", self.repo.display()));
        }

        let blank = |value: &str| value.trim().is_empty();
        match &self.command {
            Command::StartRelease {
                release_version, ..
            } if blank(release_version) => Err("--release-version must not be empty".to_string()),
            Command::TestRelease { branch, .. }
            | Command::PublishRelease { branch }
            | Command::FinishRelease { branch }
            | Command::TestHotfix { branch, .. }
            | Command::PublishHotfix { branch }
            | Command::FinishHotfix { branch }
            | Command::BuildBranch { branch, .. }
                if blank(branch) =>
            {
                Err("--branch must not be empty".to_string())
            }
            Command::StartFeature { feature, .. } | Command::FinishFeature { feature, .. }
                if blank(feature) =>
            {
                Err("--feature must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
    /// Working copy of the repository
    pub repo: PathBuf,
    /// Configuration file to load
    pub config_path: PathBuf,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
            repo: args.repo.clone(),
            config_path: args
                .config
                .clone()
                .unwrap_or_else(|| args.repo.join(CONFIG_FILE_NAME)),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Load and validate the Gitflow configuration
    pub fn load_gitflow_config(&self) -> Result<GitflowConfig> {
        GitflowConfig::load_from_file(&self.config_path)
    }

    /// Directory of the build history
    pub fn state_dir(&self, config: &GitflowConfig) -> PathBuf {
        self.repo.join(&config.state_dir)
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print verbose message (only in verbose mode)
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}
