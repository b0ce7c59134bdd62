//! Gitflow actions and the orchestrator that runs them around the main build.
//!
//! Every action implements the two hooks of [`GitflowAction`]. A
//! [`GitflowRun`] owns the action together with its [`ActionContext`] and
//! drives it through the lifecycle:
//!
//! ```text
//! Created -> BeforeRunning -> BeforeDone -> (main build) -> AfterRunning -> AfterDone
//! ```
//!
//! The shared steps (badge, clean checkout, archive suppression and the
//! unstable promotion) live in the orchestrator; the actions only contain
//! their own git and version sequence.

mod branch_build;
mod cause;
mod context;
mod feature;
mod finish;
mod publish;
mod start_hotfix;
mod start_release;
mod test_branch;

pub use branch_build::BranchBuildAction;
pub use cause::{BranchCause, ReleaseKind, StartHotfixCause, StartReleaseCause, TestCause};
pub use context::{
    ActionContext, GIT_BRANCH_TYPE, GIT_REMOTE_BRANCH_NAME, GIT_SIMPLE_BRANCH_NAME, Runtime,
};
pub use feature::{FinishFeatureAction, StartFeatureAction};
pub use finish::FinishAction;
pub use publish::PublishAction;
pub use start_hotfix::StartHotfixAction;
pub use start_release::StartReleaseAction;
pub use test_branch::TestAction;

use crate::build::{Build, BuildHistory, EnvVarMap};
use crate::data::{BranchRecordStore, BuildResult, StoreOrigin, resolve_or_inherit};
use crate::error::{GitflowError, Result};
use crate::git::GitOperations;
use crate::version::BuildTypeAction;
use chrono::{Duration, Utc};
use std::fmt;
use std::future::Future;

/// The two-phase protocol every Gitflow action implements
pub trait GitflowAction {
    /// Display name used in console lines and the badge
    fn action_name(&self) -> &'static str;

    /// Whether the run is a rehearsal without pushes
    fn is_dry_run(&self) -> bool;

    /// Whether the main build is skipped because all work happens in the before-hook
    fn is_omit_main_build(&self) -> bool {
        false
    }

    /// Action specific work before the main build
    fn before_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> impl Future<Output = Result<()>>
    where
        G: GitOperations,
        B: BuildTypeAction;

    /// Action specific work after the main build
    fn after_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> impl Future<Output = Result<()>>
    where
        G: GitOperations,
        B: BuildTypeAction;
}

/// Every action the runner knows about
#[derive(Debug, Clone)]
pub enum Action {
    /// Cut a release branch from develop
    StartRelease(StartReleaseAction),
    /// Build, tag and bump a release or hotfix branch
    Test(TestAction),
    /// Merge a tested release or hotfix into master
    Publish(PublishAction),
    /// Delete a release or hotfix branch
    Finish(FinishAction),
    /// Cut a hotfix branch from master
    StartHotfix(StartHotfixAction),
    /// Cut a feature branch from develop
    StartFeature(StartFeatureAction),
    /// Merge a feature branch into develop
    FinishFeature(FinishFeatureAction),
    /// Build a branch and record its result
    BranchBuild(BranchBuildAction),
}

impl GitflowAction for Action {
    fn action_name(&self) -> &'static str {
        match self {
            Action::StartRelease(action) => action.action_name(),
            Action::Test(action) => action.action_name(),
            Action::Publish(action) => action.action_name(),
            Action::Finish(action) => action.action_name(),
            Action::StartHotfix(action) => action.action_name(),
            Action::StartFeature(action) => action.action_name(),
            Action::FinishFeature(action) => action.action_name(),
            Action::BranchBuild(action) => action.action_name(),
        }
    }

    fn is_dry_run(&self) -> bool {
        match self {
            Action::StartRelease(action) => action.is_dry_run(),
            Action::Test(action) => action.is_dry_run(),
            Action::Publish(action) => action.is_dry_run(),
            Action::Finish(action) => action.is_dry_run(),
            Action::StartHotfix(action) => action.is_dry_run(),
            Action::StartFeature(action) => action.is_dry_run(),
            Action::FinishFeature(action) => action.is_dry_run(),
            Action::BranchBuild(action) => action.is_dry_run(),
        }
    }

    fn is_omit_main_build(&self) -> bool {
        match self {
            Action::StartRelease(action) => action.is_omit_main_build(),
            Action::Test(action) => action.is_omit_main_build(),
            Action::Publish(action) => action.is_omit_main_build(),
            Action::Finish(action) => action.is_omit_main_build(),
            Action::StartHotfix(action) => action.is_omit_main_build(),
            Action::StartFeature(action) => action.is_omit_main_build(),
            Action::FinishFeature(action) => action.is_omit_main_build(),
            Action::BranchBuild(action) => action.is_omit_main_build(),
        }
    }

    async fn before_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        match self {
            Action::StartRelease(action) => action.before_main_build_internal(ctx).await,
            Action::Test(action) => action.before_main_build_internal(ctx).await,
            Action::Publish(action) => action.before_main_build_internal(ctx).await,
            Action::Finish(action) => action.before_main_build_internal(ctx).await,
            Action::StartHotfix(action) => action.before_main_build_internal(ctx).await,
            Action::StartFeature(action) => action.before_main_build_internal(ctx).await,
            Action::FinishFeature(action) => action.before_main_build_internal(ctx).await,
            Action::BranchBuild(action) => action.before_main_build_internal(ctx).await,
        }
    }

    async fn after_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        match self {
            Action::StartRelease(action) => action.after_main_build_internal(ctx).await,
            Action::Test(action) => action.after_main_build_internal(ctx).await,
            Action::Publish(action) => action.after_main_build_internal(ctx).await,
            Action::Finish(action) => action.after_main_build_internal(ctx).await,
            Action::StartHotfix(action) => action.after_main_build_internal(ctx).await,
            Action::StartFeature(action) => action.after_main_build_internal(ctx).await,
            Action::FinishFeature(action) => action.after_main_build_internal(ctx).await,
            Action::BranchBuild(action) => action.after_main_build_internal(ctx).await,
        }
    }
}

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    /// Store resolved, nothing run yet
    Created,
    /// Before-hook in progress or aborted
    BeforeRunning,
    /// Before-hook done, main build may run
    BeforeDone,
    /// After-hook in progress or aborted
    AfterRunning,
    /// Run complete
    AfterDone,
}

impl fmt::Display for ActionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionPhase::Created => "CREATED",
            ActionPhase::BeforeRunning => "BEFORE_RUNNING",
            ActionPhase::BeforeDone => "BEFORE_DONE",
            ActionPhase::AfterRunning => "AFTER_RUNNING",
            ActionPhase::AfterDone => "AFTER_DONE",
        };
        f.write_str(name)
    }
}

/// One action executing in one build
pub struct GitflowRun<'a, A, G, B> {
    action: A,
    phase: ActionPhase,
    origin: StoreOrigin,
    context: ActionContext<'a, G, B>,
}

impl<'a, A, G, B> GitflowRun<'a, A, G, B>
where
    A: GitflowAction,
    G: GitOperations,
    B: BuildTypeAction,
{
    /// Prepare `action` in `build`.
    ///
    /// Resolves the branch record store of the run (the build's own, inherited from the
    /// history or fresh), tags it with the dry-run flag and registers the badge.
    pub async fn new<H>(
        action: A,
        mut build: Build,
        history: &H,
        runtime: Runtime<'a, G, B>,
    ) -> Result<Self>
    where
        H: BuildHistory + ?Sized,
    {
        let resolved =
            resolve_or_inherit(build.gitflow_data.as_ref(), history, build.number, runtime.git)
                .await?;
        match &resolved.origin {
            StoreOrigin::Current => log::debug!("Using branch records of build #{}", build.number),
            StoreOrigin::Inherited { build_number, .. } => {
                log::debug!("Inherited branch records from build #{}", build_number)
            }
            StoreOrigin::Fresh => log::debug!("No earlier branch records, starting empty"),
        }

        let remote_url = runtime.git.get_remote_url(&runtime.config.remote).await?;
        log::debug!("Remote {} is {}", runtime.config.remote, remote_url);

        let mut store = resolved.store;
        let retention_days = runtime.config.tombstone_retention_days;
        let purged =
            store.purge_tombstones(Utc::now() - Duration::days(i64::from(retention_days)));
        if !purged.is_empty() {
            log::info!(
                "Erased records of branches deleted more than {} days ago: {}",
                retention_days,
                purged.join(", ")
            );
        }
        store.dry_run = action.is_dry_run();
        build.add_badge(action.action_name());

        let context = ActionContext::new(
            action.action_name(),
            runtime,
            action.is_dry_run(),
            store,
            build,
        );

        Ok(Self {
            action,
            phase: ActionPhase::Created,
            origin: resolved.origin,
            context,
        })
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ActionPhase {
        self.phase
    }

    /// Where the branch record store of this run came from
    pub fn store_origin(&self) -> &StoreOrigin {
        &self.origin
    }

    /// The running action
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Context shared with the hooks
    pub fn context(&self) -> &ActionContext<'a, G, B> {
        &self.context
    }

    /// Branch records as far as the run got
    pub fn store(&self) -> &BranchRecordStore {
        self.context.store()
    }

    /// Environment variables for the main build
    pub fn env_vars(&self) -> &EnvVarMap {
        self.context.env_vars()
    }

    /// Whether the main build is skipped
    pub fn is_omit_main_build(&self) -> bool {
        self.action.is_omit_main_build()
    }

    /// Result of the build so far
    pub fn build_result(&self) -> BuildResult {
        self.context.build_result()
    }

    /// Record the terminal result of the main build
    pub fn set_build_result(&mut self, result: BuildResult) {
        self.context.build_mut().set_result(result);
    }

    fn enter(&mut self, hook: &'static str, expected: ActionPhase, next: ActionPhase) -> Result<()> {
        if self.phase != expected {
            return Err(GitflowError::InvalidPhase {
                hook,
                phase: self.phase.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Run everything that has to happen before the main build
    pub async fn before_main_build(&mut self) -> Result<()> {
        self.enter(
            "before_main_build",
            ActionPhase::Created,
            ActionPhase::BeforeRunning,
        )?;

        let action_name = self.action.action_name();
        self.context.build_mut().add_badge(action_name);

        self.context.clean_checkout().await?;

        self.action
            .before_main_build_internal(&mut self.context)
            .await?;

        // No archives are published for rehearsals or builds without a main build
        if self.action.is_dry_run() || self.action.is_omit_main_build() {
            let build_type = self.context.build_type();
            build_type.prevent_archive_publication(self.context.env_vars_mut());
        }

        self.phase = ActionPhase::BeforeDone;
        Ok(())
    }

    /// Run everything that has to happen after the main build
    pub async fn after_main_build(&mut self) -> Result<()> {
        self.enter(
            "after_main_build",
            ActionPhase::BeforeDone,
            ActionPhase::AfterRunning,
        )?;

        self.action
            .after_main_build_internal(&mut self.context)
            .await?;

        let config = self.context.config();
        if self.context.build_result().is_better_than(BuildResult::Unstable)
            && config.mark_successful_build_unstable_on_broken_branches
        {
            let unstable = self
                .context
                .store()
                .group_unstable_by_result(BuildResult::Success);
            if !unstable.is_empty() {
                self.context.log(&format!(
                    "Changing result of successful build to unstable, because there are unstable branches: {}",
                    unstable
                ));
                self.context.build_mut().set_result(BuildResult::Unstable);
            }
        }

        self.phase = ActionPhase::AfterDone;
        Ok(())
    }

    /// Finish the run and hand back the build with the store attached.
    ///
    /// Works in every phase: a run aborted by an error is persisted as far as it got.
    pub fn into_build(self) -> Build {
        let (mut build, store, env_vars) = self.context.into_parts();
        build.env_vars = env_vars;
        build.gitflow_data = Some(store);
        build.finish();
        build
    }
}
