//! Finish Release / Finish Hotfix: delete a release line that is done.

use crate::action::{ActionContext, BranchCause, GitflowAction, ReleaseKind};
use crate::error::Result;
use crate::git::GitOperations;
use crate::version::BuildTypeAction;

/// Deletes a release or hotfix branch locally and on the remote and drops its record.
///
/// Runs entirely before the main build, which is omitted.
#[derive(Debug, Clone)]
pub struct FinishAction {
    kind: ReleaseKind,
    cause: BranchCause,
}

impl FinishAction {
    /// Finish Release for `cause`
    pub fn release(cause: BranchCause) -> Self {
        Self {
            kind: ReleaseKind::Release,
            cause,
        }
    }

    /// Finish Hotfix for `cause`
    pub fn hotfix(cause: BranchCause) -> Self {
        Self {
            kind: ReleaseKind::Hotfix,
            cause,
        }
    }
}

impl GitflowAction for FinishAction {
    fn action_name(&self) -> &'static str {
        match self.kind {
            ReleaseKind::Release => "Finish Release",
            ReleaseKind::Hotfix => "Finish Hotfix",
        }
    }

    fn is_dry_run(&self) -> bool {
        self.cause.dry_run
    }

    fn is_omit_main_build(&self) -> bool {
        true
    }

    async fn before_main_build_internal<G, B>(
        &mut self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        ctx.require_branch_type(self.kind, &self.cause.branch)?;
        ctx.delete_branch(&self.cause.branch).await
    }

    async fn after_main_build_internal<G, B>(
        &mut self,
        _ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        Ok(())
    }
}
