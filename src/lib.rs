//! # Kodegen Gitflow
//!
//! Gitflow release, hotfix and feature automation around a build pipeline.
//!
//! Each invocation is one build run. A Gitflow action wraps the main build
//! command: before it runs, the action prepares the working copy (cuts a
//! branch, sets project versions, merges). After it the action pushes, tags
//! and records the result of every branch it touched in a branch record store
//! that later runs inherit.
//!
//! ## Features
//!
//! - **Release lines**: Start, Test, Publish and Finish for release and hotfix branches
//! - **Feature branches**: Start and Finish against develop
//! - **Branch records**: Per-branch results and versions carried across builds
//! - **Unstable promotion**: Successful builds turn unstable while a branch is broken
//! - **Dry Run**: Rehearse every action without pushing
//!
//! ## Usage
//!
//! ```bash
//! kodegen_gitflow build-branch --branch develop -- cargo test
//! kodegen_gitflow start-release --release-version 1.0.0 -- cargo test
//! kodegen_gitflow --dry-run start-hotfix
//! kodegen_gitflow status --json
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod action;
pub mod build;
pub mod cli;
pub mod config;
pub mod console;
pub mod data;
pub mod error;
pub mod git;
pub mod version;

// Re-export main types for public API
pub use action::{Action, ActionContext, ActionPhase, GitflowAction, GitflowRun, Runtime};
pub use build::{Build, BuildHistory, EnvVarMap, FileBuildHistory};
pub use cli::Args;
pub use config::{BranchType, GitflowConfig, MissingRecordPolicy};
pub use console::{Console, LogConsole};
pub use data::{BranchRecord, BranchRecordStore, BuildResult, StoreOrigin};
pub use error::{CliError, GitflowError, Result};
pub use git::{GitCli, GitOperations, Refspec};
pub use version::{BuildTypeAction, CargoBuildType};
