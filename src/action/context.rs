//! Mutable state of one action run and the helpers shared by all actions.

use crate::action::ReleaseKind;
use crate::build::{Build, EnvVarMap};
use crate::config::{BranchType, GitflowConfig, MissingRecordPolicy};
use crate::console::Console;
use crate::data::{BranchRecord, BranchRecordStore, BuildResult, RemovalMode};
use crate::error::{GitflowError, Result};
use crate::git::{GitOperations, Refspec};
use crate::version::BuildTypeAction;

/// Name of the branch as exported to the main build
pub const GIT_SIMPLE_BRANCH_NAME: &str = "GIT_SIMPLE_BRANCH_NAME";
/// Remote-qualified branch name exported to the main build
pub const GIT_REMOTE_BRANCH_NAME: &str = "GIT_REMOTE_BRANCH_NAME";
/// Branch classification exported to the main build
pub const GIT_BRANCH_TYPE: &str = "GIT_BRANCH_TYPE";

/// Collaborators an action run works with
pub struct Runtime<'a, G, B> {
    /// Git capability
    pub git: &'a G,
    /// Version mutation capability
    pub build_type: &'a B,
    /// Gitflow settings
    pub config: &'a GitflowConfig,
    /// Sink for console lines
    pub console: &'a dyn Console,
}

impl<G, B> Clone for Runtime<'_, G, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G, B> Copy for Runtime<'_, G, B> {}

/// Per-run context owned by the orchestrator and handed to the action hooks
pub struct ActionContext<'a, G, B> {
    action_name: &'static str,
    git: &'a G,
    build_type: &'a B,
    config: &'a GitflowConfig,
    console: &'a dyn Console,
    dry_run: bool,
    store: BranchRecordStore,
    env_vars: EnvVarMap,
    build: Build,
}

impl<'a, G, B> ActionContext<'a, G, B>
where
    G: GitOperations,
    B: BuildTypeAction,
{
    pub(crate) fn new(
        action_name: &'static str,
        runtime: Runtime<'a, G, B>,
        dry_run: bool,
        store: BranchRecordStore,
        build: Build,
    ) -> Self {
        Self {
            action_name,
            git: runtime.git,
            build_type: runtime.build_type,
            config: runtime.config,
            console: runtime.console,
            dry_run,
            store,
            env_vars: EnvVarMap::new(),
            build,
        }
    }

    /// Display name of the running action
    pub fn action_name(&self) -> &'static str {
        self.action_name
    }

    /// Git capability
    pub fn git(&self) -> &'a G {
        self.git
    }

    /// Version mutation capability
    pub fn build_type(&self) -> &'a B {
        self.build_type
    }

    /// Gitflow settings
    pub fn config(&self) -> &'a GitflowConfig {
        self.config
    }

    /// Whether pushes are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Branch records of this run
    pub fn store(&self) -> &BranchRecordStore {
        &self.store
    }

    /// Mutable branch records of this run
    pub fn store_mut(&mut self) -> &mut BranchRecordStore {
        &mut self.store
    }

    /// Environment variables collected for the main build
    pub fn env_vars(&self) -> &EnvVarMap {
        &self.env_vars
    }

    /// Mutable environment variables for the main build
    pub fn env_vars_mut(&mut self) -> &mut EnvVarMap {
        &mut self.env_vars
    }

    /// The build this action runs in
    pub fn build(&self) -> &Build {
        &self.build
    }

    /// Mutable build this action runs in
    pub fn build_mut(&mut self) -> &mut Build {
        &mut self.build
    }

    /// Result of the main build, unset counting as success
    pub fn build_result(&self) -> BuildResult {
        self.build.result_non_null()
    }

    /// Print a `Gitflow - <Action>: <message>` line
    pub fn log(&self, message: &str) {
        let line = format!("Gitflow - {}: {}", self.action_name, message);
        log::debug!("{}", line);
        self.console.println(&line);
    }

    /// Print a `Gitflow - <Action>: <message>` warning
    pub fn warn(&self, message: &str) {
        let line = format!("Gitflow - {}: {}", self.action_name, message);
        log::warn!("{}", line);
        self.console.warn(&line);
    }

    /// Error for an unmet precondition of this action
    pub fn prerequisite_error(&self, reason: impl Into<String>) -> GitflowError {
        GitflowError::Prerequisite {
            action: self.action_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Fail unless `branch_name` is named like a branch of the given release line
    pub fn require_branch_type(&self, kind: ReleaseKind, branch_name: &str) -> Result<()> {
        let expected = match kind {
            ReleaseKind::Release => BranchType::Release,
            ReleaseKind::Hotfix => BranchType::Hotfix,
        };
        if self.config.branch_type(branch_name) != expected {
            return Err(self.prerequisite_error(format!(
                "{} is not a {} branch",
                branch_name, kind
            )));
        }
        Ok(())
    }

    /// Stage files one by one, in the given order
    pub async fn add_files_to_git_stage(&self, files: &[String]) -> Result<()> {
        for file in files {
            self.git.add(file).await?;
        }
        Ok(())
    }

    /// Refresh the remote-tracking refs, then remove modified and untracked files
    /// left over from an earlier checkout
    pub async fn clean_checkout(&self) -> Result<()> {
        self.git.fetch(&self.config.remote).await?;
        self.git.clean().await?;
        self.log("Cleaned up working/checkout directory");
        Ok(())
    }

    /// Set the project files to `version`, stage the changed files and commit them with `message`.
    ///
    /// Nothing is committed when the project is already at `version`.
    pub async fn update_project_version(&self, version: &str, message: &str) -> Result<()> {
        let changed_files = self.build_type.update_version(version)?;
        if changed_files.is_empty() {
            self.log(&format!("Project files already at version {}", version));
            return Ok(());
        }
        self.add_files_to_git_stage(&changed_files).await?;
        self.git.commit(message).await?;
        self.log(message);
        Ok(())
    }

    /// Push to the configured remote; on Dry Run the push is only reported
    pub async fn push(&self, refspec: &Refspec) -> Result<()> {
        if self.dry_run {
            self.log(&format!("Dry Run: skipped push of {}", refspec));
            return Ok(());
        }
        self.git.push(&self.config.remote, refspec).await
    }

    /// Delete a branch locally and on the remote, then forget its record
    pub async fn delete_branch(&mut self, branch_name: &str) -> Result<()> {
        // A Dry Run before may never have created the local branch
        if self.git.get_branches().await?.contains(branch_name) {
            self.git.delete_branch(branch_name).await?;
        }
        self.log(&format!("Deleted branch {}", branch_name));
        self.push(&Refspec::delete_branch(branch_name)).await?;

        self.store.remove(branch_name, RemovalMode::Hard);
        Ok(())
    }

    /// Export the branch variables for the main build
    pub fn set_branch_env_vars(&mut self, branch_name: &str) {
        let remote_branch = self.config.remote_branch(branch_name);
        let branch_type = self.config.branch_type(branch_name);
        self.env_vars
            .insert(GIT_SIMPLE_BRANCH_NAME.to_string(), branch_name.to_string());
        self.env_vars
            .insert(GIT_REMOTE_BRANCH_NAME.to_string(), remote_branch);
        self.env_vars
            .insert(GIT_BRANCH_TYPE.to_string(), branch_type.to_string());
    }

    /// Record of a branch on the configured remote, created if missing
    pub fn record(&mut self, branch_name: &str) -> &mut BranchRecord {
        self.store.get_or_add_remote(&self.config.remote, branch_name)
    }

    /// Record of a branch the action depends on.
    ///
    /// A missing record is handled according to the configured [`MissingRecordPolicy`].
    pub fn prerequisite_record(&mut self, branch_name: &str) -> Result<&mut BranchRecord> {
        if !self.store.contains(branch_name) {
            let message = format!("No record exists for branch {}", branch_name);
            match self.config.missing_record_policy {
                MissingRecordPolicy::Reject => return Err(self.prerequisite_error(message)),
                MissingRecordPolicy::Warn => {
                    self.warn(&format!("{}, creating an empty one", message))
                }
                MissingRecordPolicy::Create => log::debug!("{}, creating an empty one", message),
            }
        }
        Ok(self.record(branch_name))
    }

    pub(crate) fn into_parts(self) -> (Build, BranchRecordStore, EnvVarMap) {
        (self.build, self.store, self.env_vars)
    }
}
