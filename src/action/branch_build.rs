//! Plain build of a branch without any Gitflow transition.

use crate::action::{ActionContext, BranchCause, GitflowAction};
use crate::error::Result;
use crate::git::GitOperations;
use crate::version::BuildTypeAction;

/// Checks out a branch from the remote, builds it and records the outcome.
///
/// This is how develop and master get the records the other actions depend on.
#[derive(Debug, Clone)]
pub struct BranchBuildAction {
    cause: BranchCause,
}

impl BranchBuildAction {
    /// Action for `cause`
    pub fn new(cause: BranchCause) -> Self {
        Self { cause }
    }
}

impl GitflowAction for BranchBuildAction {
    fn action_name(&self) -> &'static str {
        "Branch Build"
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
        let branch = self.cause.branch.as_str();
        let config = ctx.config();
        ctx.git()
            .checkout_branch(branch, &config.remote_branch(branch))
            .await?;
        ctx.set_branch_env_vars(branch);
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
        let result = ctx.build_result();
        let version = ctx.build_type().current_version()?;
        let record = ctx.record(&self.cause.branch);
        record.last_build_result = Some(result);
        record.last_build_version = version;
        Ok(())
    }
}
