//! Error types for kodegen_gitflow operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kodegen_gitflow operations
pub type Result<T> = std::result::Result<T, GitflowError>;

/// Main error type for all kodegen_gitflow operations
#[derive(Error, Debug)]
pub enum GitflowError {
    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Version management errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Build history errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// A branch the action depends on is missing or not in a usable state
    #[error("Gitflow - {action}: {reason}")]
    Prerequisite {
        /// Display name of the action
        action: String,
        /// Reason for the error
        reason: String,
    },

    /// The run was cancelled while an operation was in progress
    #[error("Interrupted during {operation}")]
    Interrupted {
        /// Operation that was running
        operation: String,
    },

    /// A lifecycle hook was invoked out of order
    #[error("Cannot run {hook} while action is in phase {phase}")]
    InvalidPhase {
        /// Hook that was called
        hook: &'static str,
        /// Phase the action was in
        phase: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Version management errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Invalid version format
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// Version parsing failed
    #[error("Failed to parse version '{version}': {source}")]
    ParseFailed {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// Failed to update Cargo.toml
    #[error("Failed to update Cargo.toml at {path}: {reason}")]
    TomlUpdateFailed {
        /// Path to Cargo.toml
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// A version that the action needs could not be derived
    #[error("Cannot determine {what}: {reason}")]
    Undetermined {
        /// Which version was requested
        what: String,
        /// Reason for the error
        reason: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {path}")]
    NotRepository {
        /// Path that was opened
        path: PathBuf,
    },

    /// Git executable not available
    #[error("Git executable not found: {reason}")]
    ExecutableNotFound {
        /// Reason for the error
        reason: String,
    },

    /// Remote operation failed
    #[error("Git remote operation failed: {operation} - {reason}")]
    RemoteOperationFailed {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// Tag operation failed
    #[error("Git tag '{tag}' could not be created: {reason}")]
    TagFailed {
        /// Tag name
        tag: String,
        /// Reason for the error
        reason: String,
    },

    /// Branch operation failed
    #[error("Git branch operation failed: {reason}")]
    BranchOperationFailed {
        /// Reason for the error
        reason: String,
    },

    /// Commit failed
    #[error("Git commit failed: {reason}")]
    CommitFailed {
        /// Reason for the error
        reason: String,
    },

    /// Merge failed
    #[error("Git merge of '{reference}' failed: {reason}")]
    MergeFailed {
        /// Reference that was merged
        reference: String,
        /// Reason for the error
        reason: String,
    },

    /// Push failed
    #[error("Git push of '{refspec}' failed: {reason}")]
    PushFailed {
        /// Refspec that was pushed
        refspec: String,
        /// Reason for the error
        reason: String,
    },
}

/// Build history errors
#[derive(Error, Debug)]
pub enum StateError {
    /// History file corrupted
    #[error("Build history file corrupted: {reason}")]
    Corrupted {
        /// Reason for the error
        reason: String,
    },

    /// History format version mismatch
    #[error("Build history format mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Found version
        found: String,
    },

    /// Failed to save a build
    #[error("Failed to save build: {reason}")]
    SaveFailed {
        /// Reason for the error
        reason: String,
    },

    /// Failed to load a build
    #[error("Failed to load build: {reason}")]
    LoadFailed {
        /// Reason for the error
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {reason}")]
    ReadFailed {
        /// Path to the config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// A configuration value is not usable
    #[error("Invalid config value for '{key}': {reason}")]
    InvalidValue {
        /// Config key
        key: String,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl GitflowError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            GitflowError::Git(GitError::NotRepository { .. }) => vec![
                "Run from within a git working copy or pass --repo <path>".to_string(),
            ],
            GitflowError::Git(GitError::ExecutableNotFound { .. }) => vec![
                "Install git and make sure it is on PATH".to_string(),
            ],
            GitflowError::Git(GitError::PushFailed { .. })
            | GitflowError::Git(GitError::RemoteOperationFailed { .. }) => vec![
                "Verify git remote URL: git remote -v".to_string(),
                "Check push permissions for the remote".to_string(),
                "Rehearse the action with --dry-run before re-running it".to_string(),
            ],
            GitflowError::Git(GitError::MergeFailed { .. }) => vec![
                "Resolve the conflicting changes manually and push them".to_string(),
                "Re-run the action once the branches merge cleanly".to_string(),
            ],
            GitflowError::Prerequisite { .. } => vec![
                "Run a branch build for the required branch first: kodegen_gitflow build-branch --branch <name> -- <build command>".to_string(),
                "Inspect recorded branches with: kodegen_gitflow status".to_string(),
            ],
            GitflowError::State(StateError::Corrupted { .. }) => vec![
                "Remove or repair the corrupted file in the build history directory".to_string(),
            ],
            GitflowError::Cli(CliError::InvalidArguments { .. }) => vec![
                "See the accepted arguments with: kodegen_gitflow <command> --help".to_string(),
            ],
            GitflowError::Interrupted { .. } => vec![
                "Re-run the action; no operation is retried automatically".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable by re-running the action
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            GitflowError::Git(GitError::NotRepository { .. })
                | GitflowError::Git(GitError::ExecutableNotFound { .. })
                | GitflowError::Version(VersionError::InvalidVersion { .. })
                | GitflowError::Config(_)
                | GitflowError::Cli(CliError::InvalidArguments { .. })
                | GitflowError::InvalidPhase { .. }
        )
    }

    /// Whether the run was cancelled rather than failed
    pub fn is_interrupted(&self) -> bool {
        matches!(self, GitflowError::Interrupted { .. })
    }
}
