//! Start Feature / Finish Feature.

use crate::action::{ActionContext, BranchCause, GitflowAction};
use crate::data::BuildResult;
use crate::error::Result;
use crate::git::{GitOperations, Refspec};
use crate::version::BuildTypeAction;

/// Creates a feature branch from the tip of develop and builds it.
#[derive(Debug, Clone)]
pub struct StartFeatureAction {
    cause: BranchCause,
}

impl StartFeatureAction {
    /// Action for `cause`; the branch may be given with or without the feature prefix
    pub fn new(cause: BranchCause) -> Self {
        Self { cause }
    }
}

impl GitflowAction for StartFeatureAction {
    fn action_name(&self) -> &'static str {
        "Start Feature"
    }

    fn is_dry_run(&self) -> bool {
        self.cause.dry_run
    }

    async fn before_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        let config = ctx.config();
        let develop_branch = config.develop_branch.as_str();
        ctx.prerequisite_record(develop_branch)?;

        let feature_branch = config.feature_branch(&self.cause.branch);
        ctx.git()
            .checkout_branch(&feature_branch, &config.remote_branch(develop_branch))
            .await?;
        ctx.log(&format!("Created feature branch {}", feature_branch));

        ctx.set_branch_env_vars(&feature_branch);
        Ok(())
    }

    async fn after_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        let config = ctx.config();
        let develop_branch = config.develop_branch.as_str();
        let result = ctx.build_result();
        if result != BuildResult::Success {
            // The feature branch has no changes of its own yet
            ctx.record(develop_branch).last_build_result = Some(result);
            return Ok(());
        }

        let feature_branch = config.feature_branch(&self.cause.branch);
        ctx.push(&Refspec::branch(&feature_branch)).await?;

        let develop_version = ctx
            .store()
            .get(develop_branch)
            .and_then(|r| r.last_build_version.clone());
        let record = ctx.record(&feature_branch);
        record.last_build_result = Some(BuildResult::Success);
        record.last_build_version = develop_version;
        Ok(())
    }
}

/// Merges a feature branch into develop, builds develop and deletes the feature branch.
#[derive(Debug, Clone)]
pub struct FinishFeatureAction {
    cause: BranchCause,
}

impl FinishFeatureAction {
    /// Action for `cause`; the branch may be given with or without the feature prefix
    pub fn new(cause: BranchCause) -> Self {
        Self { cause }
    }
}

impl GitflowAction for FinishFeatureAction {
    fn action_name(&self) -> &'static str {
        "Finish Feature"
    }

    fn is_dry_run(&self) -> bool {
        self.cause.dry_run
    }

    async fn before_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        let config = ctx.config();
        let git = ctx.git();
        let develop_branch = config.develop_branch.as_str();
        let feature_branch = config.feature_branch(&self.cause.branch);

        git.checkout_branch(develop_branch, &config.remote_branch(develop_branch))
            .await?;
        let merge_message = format!(
            "Merged feature branch {} into {} branch",
            feature_branch, develop_branch
        );
        git.merge(&config.remote_branch(&feature_branch), &merge_message)
            .await?;
        ctx.log(&merge_message);

        ctx.set_branch_env_vars(develop_branch);
        Ok(())
    }

    async fn after_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        let config = ctx.config();
        let develop_branch = config.develop_branch.as_str();
        let feature_branch = config.feature_branch(&self.cause.branch);
        let result = ctx.build_result();
        if result != BuildResult::Success {
            // Develop is untouched on the remote; the merge result is what broke
            ctx.record(&feature_branch).last_build_result = Some(result);
            return Ok(());
        }

        ctx.push(&Refspec::branch(develop_branch)).await?;
        let develop_version = ctx.build_type().current_version()?;
        let record = ctx.record(develop_branch);
        record.last_build_result = Some(BuildResult::Success);
        if develop_version.is_some() {
            record.last_build_version = develop_version;
        }

        ctx.delete_branch(&feature_branch).await
    }
}
