//! Start Hotfix: cut a hotfix branch from master.

use crate::action::{ActionContext, GitflowAction, StartHotfixCause};
use crate::data::BuildResult;
use crate::error::{Result, VersionError};
use crate::git::{GitOperations, Refspec};
use crate::version::{BuildTypeAction, numbers};

const ACTION_NAME: &str = "Start Hotfix";

/// Creates `<hotfix prefix><hotfix version>` from the tip of master.
///
/// The whole action runs before the main build, which is omitted. Master's
/// record is only read: its last build must have succeeded.
#[derive(Debug, Clone)]
pub struct StartHotfixAction {
    cause: StartHotfixCause,
}

impl StartHotfixAction {
    /// Action for `cause`
    pub fn new(cause: StartHotfixCause) -> Self {
        Self { cause }
    }
}

impl GitflowAction for StartHotfixAction {
    fn action_name(&self) -> &'static str {
        ACTION_NAME
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
        let config = ctx.config();
        let master_branch = config.master_branch.as_str();

        let Some(master) = ctx.store().get(master_branch).cloned() else {
            return Err(ctx.prerequisite_error(format!(
                "No record exists for branch {}",
                master_branch
            )));
        };
        if !master.is_successful() {
            let result = master
                .last_build_result
                .map_or_else(|| "unset".to_string(), |r| r.to_string());
            return Err(ctx.prerequisite_error(format!(
                "Last build of {} is {}, a hotfix can only start from a successful build",
                master_branch, result
            )));
        }

        let hotfix_version = match &self.cause.hotfix_version {
            Some(version) => version.clone(),
            None => master.base_release_version.clone().ok_or_else(|| {
                VersionError::Undetermined {
                    what: "hotfix version".to_string(),
                    reason: format!("no base release version recorded for {}", master_branch),
                }
            })?,
        };
        let next_version = match &self.cause.next_patch_development_version {
            Some(version) => version.clone(),
            None => {
                let last_release = master.last_release_version.as_deref().ok_or_else(|| {
                    VersionError::Undetermined {
                        what: "hotfix development version".to_string(),
                        reason: format!("no release version recorded for {}", master_branch),
                    }
                })?;
                numbers::next_patch_development_version(last_release)?
            }
        };

        let hotfix_branch = config.hotfix_branch(&hotfix_version);
        ctx.git()
            .checkout_branch(&hotfix_branch, &config.remote_branch(master_branch))
            .await?;
        ctx.log(&format!("Created hotfix branch {}", hotfix_branch));

        ctx.update_project_version(
            &next_version,
            &format!(
                "Updated project files to hotfix development version {}",
                next_version
            ),
        )
        .await?;
        ctx.push(&Refspec::branch(&hotfix_branch)).await?;

        let record = ctx.record(&hotfix_branch);
        record.last_build_result = Some(BuildResult::Success);
        record.last_build_version = Some(next_version);
        record.base_release_version = Some(hotfix_version);
        record.last_release_version = master.last_release_version;

        ctx.set_branch_env_vars(&hotfix_branch);
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
