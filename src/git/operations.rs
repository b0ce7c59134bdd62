//! Core Git operations trait and types for Gitflow actions.
//!
//! This module defines the GitOperations trait that specifies every Git operation
//! the Gitflow actions sequence. The implementation shipped with the binary is
//! provided by the cli_adapter module which drives the `git` executable.

use crate::error::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

/// Trait defining the Git operations required by Gitflow actions
///
/// Calls are awaited one after another; implementations never see two
/// mutations of the same repository at once.
pub trait GitOperations {
    /// Create or reset `branch_name` at `start_point` and check it out
    fn checkout_branch(
        &self,
        branch_name: &str,
        start_point: &str,
    ) -> impl Future<Output = Result<()>>;

    /// Stage a single file
    fn add(&self, path: &str) -> impl Future<Output = Result<()>>;

    /// Commit the staged changes
    fn commit(&self, message: &str) -> impl Future<Output = Result<()>>;

    /// Create an annotated tag on HEAD
    fn tag(&self, tag_name: &str, message: &str) -> impl Future<Output = Result<()>>;

    /// Push a refspec to a remote
    fn push(&self, remote: &str, refspec: &Refspec) -> impl Future<Output = Result<()>>;

    /// Update the remote-tracking refs of `remote`, dropping refs deleted there
    fn fetch(&self, remote: &str) -> impl Future<Output = Result<()>>;

    /// Discard modified and untracked files in the working copy
    fn clean(&self) -> impl Future<Output = Result<()>>;

    /// Delete a local branch
    fn delete_branch(&self, branch_name: &str) -> impl Future<Output = Result<()>>;

    /// Names of the local branches
    fn get_branches(&self) -> impl Future<Output = Result<BTreeSet<String>>>;

    /// Head commit of a branch on the remote, `None` if it doesn't exist there
    fn get_head_rev(&self, branch_name: &str) -> impl Future<Output = Result<Option<String>>>;

    /// URL configured for a remote
    fn get_remote_url(&self, remote: &str) -> impl Future<Output = Result<String>>;

    /// Merge a reference (branch, remote ref or commit) into the current branch
    fn merge(&self, reference: &str, message: &str) -> impl Future<Output = Result<()>>;
}

/// Source and destination of a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refspec {
    source: Option<String>,
    destination: String,
}

impl Refspec {
    /// Push a local branch to the remote branch of the same name
    pub fn branch(branch_name: &str) -> Self {
        let reference = format!("refs/heads/{branch_name}");
        Self {
            source: Some(reference.clone()),
            destination: reference,
        }
    }

    /// Push a tag to the remote tag of the same name
    pub fn tag(tag_name: &str) -> Self {
        let reference = format!("refs/tags/{tag_name}");
        Self {
            source: Some(reference.clone()),
            destination: reference,
        }
    }

    /// Delete a branch on the remote
    pub fn delete_branch(branch_name: &str) -> Self {
        Self {
            source: None,
            destination: format!("refs/heads/{branch_name}"),
        }
    }

    /// Whether this refspec deletes the destination
    pub fn is_delete(&self) -> bool {
        self.source.is_none()
    }

    /// Destination reference on the remote
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl fmt::Display for Refspec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}", source, self.destination),
            None => write!(f, ":{}", self.destination),
        }
    }
}
