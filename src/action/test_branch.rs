//! Test Release / Test Hotfix: build a patch version of a release line.

use crate::action::{ActionContext, GitflowAction, ReleaseKind, TestCause};
use crate::data::BuildResult;
use crate::error::{Result, VersionError};
use crate::git::{GitOperations, Refspec};
use crate::version::{BuildTypeAction, numbers};

/// Builds a release or hotfix branch at its next patch version.
///
/// After a successful build the patch version is tagged and the branch moves
/// on to the next patch development version. A failed build only records the
/// result on the branch.
#[derive(Debug, Clone)]
pub struct TestAction {
    kind: ReleaseKind,
    cause: TestCause,
    versions: Option<PatchVersions>,
}

#[derive(Debug, Clone)]
struct PatchVersions {
    patch_version: String,
    next_development_version: String,
}

impl TestAction {
    /// Test Release for `cause`
    pub fn release(cause: TestCause) -> Self {
        Self::new(ReleaseKind::Release, cause)
    }

    /// Test Hotfix for `cause`
    pub fn hotfix(cause: TestCause) -> Self {
        Self::new(ReleaseKind::Hotfix, cause)
    }

    fn new(kind: ReleaseKind, cause: TestCause) -> Self {
        Self {
            kind,
            cause,
            versions: None,
        }
    }

    /// Release line this action works on
    pub fn kind(&self) -> ReleaseKind {
        self.kind
    }

    fn resolve_versions<G, B>(&self, ctx: &mut ActionContext<'_, G, B>) -> Result<PatchVersions>
    where
        G: GitOperations,
        B: BuildTypeAction,
    {
        let branch = self.cause.branch.as_str();
        let record = ctx.prerequisite_record(branch)?;

        let patch_version = match &self.cause.patch_version {
            Some(version) => version.clone(),
            None => {
                let build_version = record.last_build_version.as_deref().ok_or_else(|| {
                    VersionError::Undetermined {
                        what: "patch version".to_string(),
                        reason: format!("no build version recorded for {}", branch),
                    }
                })?;
                numbers::release_version_of(build_version)?
            }
        };
        let next_development_version = match &self.cause.next_patch_development_version {
            Some(version) => version.clone(),
            None => numbers::next_patch_development_version(&patch_version)?,
        };

        Ok(PatchVersions {
            patch_version,
            next_development_version,
        })
    }
}

impl GitflowAction for TestAction {
    fn action_name(&self) -> &'static str {
        match self.kind {
            ReleaseKind::Release => "Test Release",
            ReleaseKind::Hotfix => "Test Hotfix",
        }
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
        ctx.require_branch_type(self.kind, branch)?;
        let versions = self.resolve_versions(ctx)?;

        let config = ctx.config();
        ctx.git()
            .checkout_branch(branch, &config.remote_branch(branch))
            .await?;
        ctx.update_project_version(
            &versions.patch_version,
            &format!(
                "Updated project files to {} version {}",
                self.kind, versions.patch_version
            ),
        )
        .await?;

        ctx.set_branch_env_vars(branch);
        self.versions = Some(versions);
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
        let branch = self.cause.branch.as_str();
        let result = ctx.build_result();
        if result != BuildResult::Success {
            ctx.record(branch).last_build_result = Some(result);
            return Ok(());
        }

        let Some(versions) = self.versions.clone() else {
            return Err(VersionError::Undetermined {
                what: "patch version".to_string(),
                reason: "before-hook did not complete".to_string(),
            }
            .into());
        };
        let config = ctx.config();
        let git = ctx.git();

        ctx.push(&Refspec::branch(branch)).await?;
        let release_commit = git.get_head_rev(branch).await?;
        let record = ctx.record(branch);
        record.last_build_result = Some(BuildResult::Success);
        record.last_build_version = Some(versions.patch_version.clone());
        record.last_release_version = Some(versions.patch_version.clone());
        record.last_release_version_commit = release_commit;

        let tag_name = config.version_tag(&versions.patch_version);
        let tag_message = format!("Created {} version tag {}", self.kind, tag_name);
        git.tag(&tag_name, &tag_message).await?;
        ctx.log(&tag_message);
        ctx.push(&Refspec::tag(&tag_name)).await?;

        ctx.update_project_version(
            &versions.next_development_version,
            &format!(
                "Updated project files to fixes development version {}",
                versions.next_development_version
            ),
        )
        .await?;
        ctx.push(&Refspec::branch(branch)).await?;

        ctx.record(branch).last_build_version = Some(versions.next_development_version);
        Ok(())
    }
}
