//! Start Release: cut a release branch from develop.

use crate::action::{ActionContext, GitflowAction, StartReleaseCause};
use crate::data::BuildResult;
use crate::error::Result;
use crate::git::{GitOperations, Refspec};
use crate::version::BuildTypeAction;

const ACTION_NAME: &str = "Start Release";

/// Creates `<release prefix><release version>` from the tip of develop.
///
/// Before the main build the release branch is created and its project files
/// are set to the release version. After a successful build the branch and a
/// release tag are pushed, the release branch moves on to the fixes
/// development version and develop moves on to the next development version.
#[derive(Debug, Clone)]
pub struct StartReleaseAction {
    cause: StartReleaseCause,
}

impl StartReleaseAction {
    /// Action for `cause`
    pub fn new(cause: StartReleaseCause) -> Self {
        Self { cause }
    }

    /// Input of this action
    pub fn cause(&self) -> &StartReleaseCause {
        &self.cause
    }

    async fn after_successful_main_build<G, B>(
        &self,
        ctx: &mut ActionContext<'_, G, B>,
    ) -> Result<()>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        let config = ctx.config();
        let git = ctx.git();
        let release_version = self.cause.release_version.as_str();
        let release_branch = config.release_branch(release_version);

        ctx.push(&Refspec::branch(&release_branch)).await?;

        // Pin the commit the release tag points at
        let release_commit = git.get_head_rev(&release_branch).await?;
        let record = ctx.record(&release_branch);
        record.last_build_result = Some(BuildResult::Success);
        record.last_build_version = Some(release_version.to_string());
        record.last_release_version = Some(release_version.to_string());
        record.base_release_version = Some(release_version.to_string());
        record.last_release_version_commit = release_commit;

        let tag_name = config.version_tag(release_version);
        let tag_message = format!("Created release version tag {}", tag_name);
        git.tag(&tag_name, &tag_message).await?;
        ctx.log(&tag_message);
        ctx.push(&Refspec::tag(&tag_name)).await?;

        let fixes_version = self.cause.release_next_development_version.as_str();
        ctx.update_project_version(
            fixes_version,
            &format!("Updated project files to fixes development version {}", fixes_version),
        )
        .await?;
        ctx.push(&Refspec::branch(&release_branch)).await?;

        let record = ctx.record(&release_branch);
        record.last_build_result = Some(BuildResult::Success);
        record.last_build_version = Some(fixes_version.to_string());

        let develop_branch = config.develop_branch.as_str();
        git.checkout_branch(develop_branch, &config.remote_branch(develop_branch))
            .await?;
        let next_version = self.cause.next_development_version.as_str();
        ctx.update_project_version(
            next_version,
            &format!(
                "Updated project files on {} branch to next development version {}",
                develop_branch, next_version
            ),
        )
        .await?;
        ctx.push(&Refspec::branch(develop_branch)).await?;

        let record = ctx.record(develop_branch);
        record.last_build_result = Some(BuildResult::Success);
        record.last_build_version = Some(next_version.to_string());

        Ok(())
    }
}

impl GitflowAction for StartReleaseAction {
    fn action_name(&self) -> &'static str {
        ACTION_NAME
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

        let release_version = self.cause.release_version.as_str();
        let release_branch = config.release_branch(release_version);
        ctx.git()
            .checkout_branch(&release_branch, &config.remote_branch(develop_branch))
            .await?;
        ctx.log(&format!("Created release branch {}", release_branch));

        ctx.update_project_version(
            release_version,
            &format!("Updated project files to release version {}", release_version),
        )
        .await?;

        ctx.set_branch_env_vars(&release_branch);
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
        if result == BuildResult::Success {
            return self.after_successful_main_build(ctx).await;
        }

        // The build is assumed to have failed on the develop state before any version change
        // took effect, so only the result is recorded.
        let develop_branch = ctx.config().develop_branch.as_str();
        ctx.record(develop_branch).last_build_result = Some(result);
        Ok(())
    }
}
