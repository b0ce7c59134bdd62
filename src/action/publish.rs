//! Publish Release / Publish Hotfix: merge a tested release into master.

use crate::action::{ActionContext, BranchCause, GitflowAction, ReleaseKind};
use crate::data::BuildResult;
use crate::error::{Result, VersionError};
use crate::git::{GitOperations, Refspec};
use crate::version::BuildTypeAction;

/// Merges the last tested release commit of a release or hotfix branch into master.
///
/// Runs entirely before the main build, which is omitted.
#[derive(Debug, Clone)]
pub struct PublishAction {
    kind: ReleaseKind,
    cause: BranchCause,
}

impl PublishAction {
    /// Publish Release for `cause`
    pub fn release(cause: BranchCause) -> Self {
        Self {
            kind: ReleaseKind::Release,
            cause,
        }
    }

    /// Publish Hotfix for `cause`
    pub fn hotfix(cause: BranchCause) -> Self {
        Self {
            kind: ReleaseKind::Hotfix,
            cause,
        }
    }
}

impl GitflowAction for PublishAction {
    fn action_name(&self) -> &'static str {
        match self.kind {
            ReleaseKind::Release => "Publish Release",
            ReleaseKind::Hotfix => "Publish Hotfix",
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
        let branch = self.cause.branch.as_str();
        ctx.require_branch_type(self.kind, branch)?;

        let record = ctx.prerequisite_record(branch)?.clone();
        if !record.is_successful() {
            let result = record
                .last_build_result
                .map_or_else(|| "unset".to_string(), |r| r.to_string());
            return Err(ctx.prerequisite_error(format!(
                "Last build of {} is {}, only a successful build can be published",
                branch, result
            )));
        }
        let Some(release_commit) = record.last_release_version_commit.clone() else {
            return Err(ctx.prerequisite_error(format!(
                "No release commit recorded for {}",
                branch
            )));
        };
        let release_version = record.last_release_version.clone().ok_or_else(|| {
            VersionError::Undetermined {
                what: "release version".to_string(),
                reason: format!("no release version recorded for {}", branch),
            }
        })?;

        let config = ctx.config();
        let git = ctx.git();
        let master_branch = config.master_branch.as_str();
        git.checkout_branch(master_branch, &config.remote_branch(master_branch))
            .await?;

        let merge_message = format!(
            "Merged {} version {} into {} branch",
            self.kind, release_version, master_branch
        );
        git.merge(&release_commit, &merge_message).await?;
        ctx.log(&merge_message);
        ctx.push(&Refspec::branch(master_branch)).await?;

        let master = ctx.record(master_branch);
        master.last_build_result = Some(BuildResult::Success);
        master.last_build_version = Some(release_version.clone());
        master.last_release_version = Some(release_version);
        master.base_release_version = record.base_release_version;
        master.last_release_version_commit = Some(release_commit);

        ctx.set_branch_env_vars(master_branch);
        Ok(())
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
