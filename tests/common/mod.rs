//! In-memory collaborators for driving actions without a repository.

#![allow(dead_code)]

use kodegen_gitflow::action::{GitflowAction, GitflowRun, Runtime};
use kodegen_gitflow::build::{Build, BuildHistory, EnvVarMap};
use kodegen_gitflow::config::GitflowConfig;
use kodegen_gitflow::console::Console;
use kodegen_gitflow::data::BranchRecordStore;
use kodegen_gitflow::error::{GitError, Result};
use kodegen_gitflow::git::{GitOperations, Refspec};
use kodegen_gitflow::version::{BuildTypeAction, GITFLOW_SKIP_ARCHIVE};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

/// Project files the mock build type reports as changed
pub const PROJECT_FILES: [&str; 4] = ["pom.xml", "child1/pom.xml", "child2/pom.xml", "child3/pom.xml"];

/// Git double recording every mutating call as one line
#[derive(Default)]
pub struct MockGit {
    calls: RefCell<Vec<String>>,
    branches: RefCell<BTreeSet<String>>,
    remote_heads: RefCell<BTreeMap<String, String>>,
    fail_push: Cell<bool>,
}

impl MockGit {
    /// Repository whose remote has master and develop
    pub fn new() -> Self {
        Self::default()
            .with_remote_head("master", "5a5a5a")
            .with_remote_head("develop", "d3d3d3")
    }

    /// Make `branch` exist on the remote at `commit`
    pub fn with_remote_head(self, branch: &str, commit: &str) -> Self {
        self.remote_heads
            .borrow_mut()
            .insert(branch.to_string(), commit.to_string());
        self
    }

    /// Make `branch` exist locally
    pub fn with_local_branch(self, branch: &str) -> Self {
        self.branches.borrow_mut().insert(branch.to_string());
        self
    }

    pub fn fail_pushes(&self) {
        self.fail_push.set(true);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl GitOperations for MockGit {
    async fn checkout_branch(&self, branch_name: &str, start_point: &str) -> Result<()> {
        self.branches.borrow_mut().insert(branch_name.to_string());
        self.record(format!("checkout {} {}", branch_name, start_point));
        Ok(())
    }

    async fn add(&self, path: &str) -> Result<()> {
        self.record(format!("add {}", path));
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.record(format!("commit {}", message));
        Ok(())
    }

    async fn tag(&self, tag_name: &str, message: &str) -> Result<()> {
        self.record(format!("tag {} {}", tag_name, message));
        Ok(())
    }

    async fn push(&self, remote: &str, refspec: &Refspec) -> Result<()> {
        if self.fail_push.get() {
            return Err(GitError::PushFailed {
                refspec: refspec.to_string(),
                reason: "rejected".to_string(),
            }
            .into());
        }
        self.record(format!("push {} {}", remote, refspec));
        Ok(())
    }

    async fn fetch(&self, remote: &str) -> Result<()> {
        self.record(format!("fetch {}", remote));
        Ok(())
    }

    async fn clean(&self) -> Result<()> {
        self.record("clean".to_string());
        Ok(())
    }

    async fn delete_branch(&self, branch_name: &str) -> Result<()> {
        self.branches.borrow_mut().remove(branch_name);
        self.record(format!("delete {}", branch_name));
        Ok(())
    }

    async fn get_branches(&self) -> Result<BTreeSet<String>> {
        Ok(self.branches.borrow().clone())
    }

    async fn get_head_rev(&self, branch_name: &str) -> Result<Option<String>> {
        Ok(self.remote_heads.borrow().get(branch_name).cloned())
    }

    async fn get_remote_url(&self, remote: &str) -> Result<String> {
        Ok(format!("https://git.example.com/{}/project.git", remote))
    }

    async fn merge(&self, reference: &str, message: &str) -> Result<()> {
        self.record(format!("merge {} {}", reference, message));
        Ok(())
    }
}

/// Build type double remembering the versions it was asked to apply
pub struct MockBuildType {
    versions: RefCell<Vec<String>>,
    current: RefCell<Option<String>>,
}

impl MockBuildType {
    pub fn new() -> Self {
        Self {
            versions: RefCell::new(Vec::new()),
            current: RefCell::new(None),
        }
    }

    pub fn with_current_version(self, version: &str) -> Self {
        *self.current.borrow_mut() = Some(version.to_string());
        self
    }

    pub fn versions(&self) -> Vec<String> {
        self.versions.borrow().clone()
    }
}

impl BuildTypeAction for MockBuildType {
    fn update_version(&self, version: &str) -> Result<Vec<String>> {
        self.versions.borrow_mut().push(version.to_string());
        let previous = self.current.borrow_mut().replace(version.to_string());
        if previous.as_deref() == Some(version) {
            return Ok(Vec::new());
        }
        Ok(PROJECT_FILES.iter().map(|f| f.to_string()).collect())
    }

    fn current_version(&self) -> Result<Option<String>> {
        Ok(self.current.borrow().clone())
    }

    fn prevent_archive_publication(&self, env_vars: &mut EnvVarMap) {
        env_vars.insert(GITFLOW_SKIP_ARCHIVE.to_string(), "true".to_string());
    }
}

/// Build history kept in memory
#[derive(Default)]
pub struct MemoryHistory {
    builds: RefCell<Vec<Build>>,
}

impl MemoryHistory {
    pub fn push(&self, build: Build) {
        self.builds.borrow_mut().push(build);
    }

    /// Add a finished build carrying `store`
    pub fn push_store(&self, number: u64, store: BranchRecordStore) {
        let mut build = Build::new(number);
        build.gitflow_data = Some(store);
        self.push(build);
    }

    pub fn next_number(&self) -> u64 {
        self.builds
            .borrow()
            .iter()
            .map(|b| b.number)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl BuildHistory for MemoryHistory {
    fn previous_build(&self, number: u64) -> Result<Option<Build>> {
        Ok(self
            .builds
            .borrow()
            .iter()
            .filter(|b| b.number < number)
            .max_by_key(|b| b.number)
            .cloned())
    }
}

/// Console keeping every printed line
#[derive(Default)]
pub struct RecordingConsole {
    lines: RefCell<Vec<String>>,
}

impl RecordingConsole {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.borrow().iter().any(|l| l == line)
    }
}

impl Console for RecordingConsole {
    fn println(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Everything an action run needs, owned in one place
pub struct Fixture {
    pub git: MockGit,
    pub build_type: MockBuildType,
    pub config: GitflowConfig,
    pub console: RecordingConsole,
    pub history: MemoryHistory,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_git(MockGit::new())
    }

    pub fn with_git(git: MockGit) -> Self {
        Self {
            git,
            build_type: MockBuildType::new(),
            config: GitflowConfig::default(),
            console: RecordingConsole::default(),
            history: MemoryHistory::default(),
        }
    }

    pub fn runtime(&self) -> Runtime<'_, MockGit, MockBuildType> {
        Runtime {
            git: &self.git,
            build_type: &self.build_type,
            config: &self.config,
            console: &self.console,
        }
    }

    /// Prepare `action` in the next build of the history
    pub async fn start<A: GitflowAction>(
        &self,
        action: A,
    ) -> GitflowRun<'_, A, MockGit, MockBuildType> {
        let build = Build::new(self.history.next_number());
        GitflowRun::new(action, build, &self.history, self.runtime())
            .await
            .expect("run is created")
    }
}

/// Store holding a single successful record
pub fn store_with_successful(branch: &str) -> BranchRecordStore {
    let mut store = BranchRecordStore::new();
    store.get_or_add(branch).last_build_result =
        Some(kodegen_gitflow::data::BuildResult::Success);
    store
}

/// The `add` calls for every project file
pub fn add_project_files() -> Vec<String> {
    PROJECT_FILES.iter().map(|f| format!("add {}", f)).collect()
}
