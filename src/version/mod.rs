//! Version mutation for the project being built.
//!
//! Actions never edit project files themselves. They ask a [`BuildTypeAction`]
//! to apply a version and get back the files it touched, which they then stage
//! and commit.

mod cargo;
pub mod numbers;

pub use cargo::{CARGO_PUBLISH_SKIP, CargoBuildType, GITFLOW_SKIP_ARCHIVE};

use crate::build::EnvVarMap;
use crate::error::Result;

/// Build-type specific handling of project versions
pub trait BuildTypeAction {
    /// Set the project version, returning the changed files relative to the
    /// working copy root in a stable order
    fn update_version(&self, version: &str) -> Result<Vec<String>>;

    /// Version currently declared by the project, if any
    fn current_version(&self) -> Result<Option<String>>;

    /// Tell the build pipeline not to archive or publish what it produces
    fn prevent_archive_publication(&self, env_vars: &mut EnvVarMap);
}

impl<T: BuildTypeAction + ?Sized> BuildTypeAction for &T {
    fn update_version(&self, version: &str) -> Result<Vec<String>> {
        (**self).update_version(version)
    }

    fn current_version(&self) -> Result<Option<String>> {
        (**self).current_version()
    }

    fn prevent_archive_publication(&self, env_vars: &mut EnvVarMap) {
        (**self).prevent_archive_publication(env_vars)
    }
}
