//! GitOperations backed by the `git` executable.

use crate::error::{GitError, GitflowError, Result};
use crate::git::{GitOperations, Refspec};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Git operations executed with the git command line client
#[derive(Debug, Clone)]
pub struct GitCli {
    git: PathBuf,
    work_dir: PathBuf,
    remote: String,
    clean_excludes: Vec<String>,
}

impl GitCli {
    /// Open the working copy at `path`, resolving remote heads against `remote`
    pub async fn open<P: AsRef<Path>>(path: P, remote: &str) -> Result<Self> {
        let git = which::which("git").map_err(|e| GitError::ExecutableNotFound {
            reason: e.to_string(),
        })?;
        let work_dir = path.as_ref().to_path_buf();

        let cli = Self {
            git,
            work_dir,
            remote: remote.to_string(),
            clean_excludes: Vec::new(),
        };

        let output = cli.run(&["rev-parse", "--is-inside-work-tree"]).await?;
        if !output.status.success() || String::from_utf8_lossy(&output.stdout).trim() != "true" {
            return Err(GitError::NotRepository {
                path: cli.work_dir.clone(),
            }
            .into());
        }

        Ok(cli)
    }

    /// Working copy this client operates on
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Keep `path` (relative to the working copy) when the checkout is cleaned
    pub fn preserve_on_clean<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.is_relative() {
            self.clean_excludes.push(format!("/{}", path.display()));
        }
        self
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        log::debug!("git {}", args.join(" "));
        let output = tokio::process::Command::new(&self.git)
            .args(args)
            .current_dir(&self.work_dir)
            .kill_on_drop(true)
            .output()
            .await?;

        // No exit code means the process was terminated by a signal
        if output.status.code().is_none() {
            return Err(GitflowError::Interrupted {
                operation: format!("git {}", args.join(" ")),
            });
        }

        Ok(output)
    }

    /// Run git and return trimmed stdout, mapping a non-zero exit through `on_failure`
    async fn run_checked<F>(&self, args: &[&str], on_failure: F) -> Result<String>
    where
        F: FnOnce(String) -> GitError,
    {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(on_failure(stderr).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitOperations for GitCli {
    async fn checkout_branch(&self, branch_name: &str, start_point: &str) -> Result<()> {
        self.run_checked(&["checkout", "-B", branch_name, start_point], |reason| {
            GitError::BranchOperationFailed {
                reason: format!("checkout of {branch_name} from {start_point}: {reason}"),
            }
        })
        .await
        .map(|_| ())
    }

    async fn add(&self, path: &str) -> Result<()> {
        self.run_checked(&["add", "--", path], |reason| GitError::CommitFailed {
            reason: format!("failed to add {path}: {reason}"),
        })
        .await
        .map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.run_checked(&["commit", "-m", message], |reason| GitError::CommitFailed {
            reason,
        })
        .await
        .map(|_| ())
    }

    async fn tag(&self, tag_name: &str, message: &str) -> Result<()> {
        self.run_checked(&["tag", "-a", tag_name, "-m", message], |reason| {
            GitError::TagFailed {
                tag: tag_name.to_string(),
                reason,
            }
        })
        .await
        .map(|_| ())
    }

    async fn push(&self, remote: &str, refspec: &Refspec) -> Result<()> {
        let refspec_str = refspec.to_string();
        self.run_checked(&["push", remote, &refspec_str], |reason| GitError::PushFailed {
            refspec: refspec_str.clone(),
            reason,
        })
        .await
        .map(|_| ())
    }

    async fn fetch(&self, remote: &str) -> Result<()> {
        self.run_checked(&["fetch", "--prune", remote], |reason| {
            GitError::RemoteOperationFailed {
                operation: format!("fetch {remote}"),
                reason,
            }
        })
        .await
        .map(|_| ())
    }

    async fn clean(&self) -> Result<()> {
        self.run_checked(&["reset", "--hard"], |reason| GitError::BranchOperationFailed {
            reason: format!("reset of working copy: {reason}"),
        })
        .await?;
        let mut args = vec!["clean", "-fdx"];
        for pattern in &self.clean_excludes {
            args.extend(["-e", pattern.as_str()]);
        }
        self.run_checked(&args, |reason| GitError::BranchOperationFailed {
            reason: format!("clean of working copy: {reason}"),
        })
        .await
        .map(|_| ())
    }

    async fn delete_branch(&self, branch_name: &str) -> Result<()> {
        self.run_checked(&["branch", "-D", branch_name], |reason| {
            GitError::BranchOperationFailed {
                reason: format!("delete of {branch_name}: {reason}"),
            }
        })
        .await
        .map(|_| ())
    }

    async fn get_branches(&self) -> Result<BTreeSet<String>> {
        let stdout = self
            .run_checked(
                &["for-each-ref", "--format=%(refname:short)", "refs/heads/"],
                |reason| GitError::BranchOperationFailed { reason },
            )
            .await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn get_head_rev(&self, branch_name: &str) -> Result<Option<String>> {
        let reference = format!("refs/heads/{branch_name}");
        let stdout = self
            .run_checked(&["ls-remote", &self.remote, &reference], |reason| {
                GitError::RemoteOperationFailed {
                    operation: format!("ls-remote {reference}"),
                    reason,
                }
            })
            .await?;

        // "<sha>\trefs/heads/<branch>" - only an exact ref match counts
        Ok(stdout.lines().find_map(|line| {
            let (sha, name) = line.split_once('\t')?;
            (name.trim() == reference).then(|| sha.trim().to_string())
        }))
    }

    async fn get_remote_url(&self, remote: &str) -> Result<String> {
        self.run_checked(&["remote", "get-url", remote], |reason| {
            GitError::RemoteOperationFailed {
                operation: format!("get-url {remote}"),
                reason,
            }
        })
        .await
    }

    async fn merge(&self, reference: &str, message: &str) -> Result<()> {
        let output = self
            .run(&["merge", "--no-ff", "-m", message, reference])
            .await?;
        if output.status.success() {
            return Ok(());
        }

        let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
        // Leave the working copy usable for the next clean checkout
        if let Err(e) = self.run(&["merge", "--abort"]).await {
            log::warn!("Failed to abort merge of {}: {}", reference, e);
        }
        Err(GitError::MergeFailed {
            reference: reference.to_string(),
            reason,
        }
        .into())
    }
}
