//! Build history persistence.
//!
//! Every finished build is written to its own JSON file so that later runs can
//! walk backward through the history and inherit the branch record store.
//! Writes go through a temporary file and an atomic rename while holding an
//! advisory lock on the history directory.

use crate::build::Build;
use crate::data::{BranchRecordStore, STORE_FORMAT_VERSION};
use crate::error::{Result, StateError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lookup of earlier builds
pub trait BuildHistory {
    /// The closest build numbered below `number`, if any
    fn previous_build(&self, number: u64) -> Result<Option<Build>>;

    /// Walk backward from `number` to the first build that carries a branch record store.
    ///
    /// Stores of Dry Run builds are skipped: nothing they recorded reached the remote.
    /// Returns the number of that build together with an owned copy of its store.
    fn previous_store(&self, number: u64) -> Result<Option<(u64, BranchRecordStore)>> {
        let mut current = number;
        while let Some(build) = self.previous_build(current)? {
            if build.number >= current {
                break;
            }
            match build.gitflow_data {
                Some(store) if store.dry_run => {
                    log::debug!("Skipping branch records of Dry Run build #{}", build.number);
                }
                Some(store) => return Ok(Some((build.number, store))),
                None => {}
            }
            current = build.number;
        }
        Ok(None)
    }
}

/// Build history stored as one JSON file per build
#[derive(Debug, Clone)]
pub struct FileBuildHistory {
    /// Directory holding `<number>.json`
    builds_dir: PathBuf,
    /// Path to lock file
    lock_file_path: PathBuf,
    /// Timeout for acquiring the lock
    lock_timeout: Duration,
}

/// Held while a build is written; the lock is released on drop
struct HistoryLock {
    #[cfg(unix)]
    _lock_handle: nix::fcntl::Flock<fs::File>,
    #[cfg(not(unix))]
    _lock_handle: fs::File,
}

impl FileBuildHistory {
    /// History kept under `<state_dir>/builds`
    pub fn new<P: AsRef<Path>>(state_dir: P) -> Self {
        let state_dir = state_dir.as_ref();
        Self {
            builds_dir: state_dir.join("builds"),
            lock_file_path: state_dir.join("builds.lock"),
            lock_timeout: Duration::from_millis(5000),
        }
    }

    /// Override how long `save` waits for the lock
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Directory the build files live in
    pub fn builds_dir(&self) -> &Path {
        &self.builds_dir
    }

    fn build_path(&self, number: u64) -> PathBuf {
        self.builds_dir.join(format!("{number}.json"))
    }

    /// Numbers of all recorded builds in ascending order
    pub fn numbers(&self) -> Result<Vec<u64>> {
        if !self.builds_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.builds_dir).map_err(|e| StateError::LoadFailed {
            reason: format!("Failed to read {}: {}", self.builds_dir.display(), e),
        })?;

        let mut numbers: Vec<u64> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != "json" {
                    return None;
                }
                path.file_stem()?.to_str()?.parse().ok()
            })
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Number the next build should use
    pub fn next_number(&self) -> Result<u64> {
        Ok(self.numbers()?.last().map_or(1, |n| n + 1))
    }

    /// Most recent recorded build
    pub fn latest(&self) -> Result<Option<Build>> {
        match self.numbers()?.last() {
            Some(&number) => self.load(number).map(Some),
            None => Ok(None),
        }
    }

    /// Load a recorded build
    pub fn load(&self, number: u64) -> Result<Build> {
        let path = self.build_path(number);
        let contents = fs::read_to_string(&path).map_err(|e| StateError::LoadFailed {
            reason: format!("Failed to read file {}: {}", path.display(), e),
        })?;

        let build: Build = serde_json::from_str(&contents).map_err(|e| StateError::Corrupted {
            reason: format!("Failed to deserialize build {}: {}", path.display(), e),
        })?;

        if let Some(store) = &build.gitflow_data
            && store.format_version > STORE_FORMAT_VERSION
        {
            return Err(StateError::VersionMismatch {
                expected: STORE_FORMAT_VERSION.to_string(),
                found: store.format_version.to_string(),
            }
            .into());
        }

        Ok(build)
    }

    /// Persist a build, replacing an earlier file with the same number
    pub async fn save(&self, build: &Build) -> Result<PathBuf> {
        fs::create_dir_all(&self.builds_dir).map_err(|e| StateError::SaveFailed {
            reason: format!("Failed to create {}: {}", self.builds_dir.display(), e),
        })?;

        let _lock = self.acquire_lock().await?;

        let serialized = serde_json::to_string_pretty(build).map_err(|e| StateError::SaveFailed {
            reason: format!("Failed to serialize build: {}", e),
        })?;

        let build_path = self.build_path(build.number);
        let temp_file_path = build_path.with_extension("tmp");

        {
            let mut file = fs::File::create(&temp_file_path).map_err(|e| StateError::SaveFailed {
                reason: format!("Failed to create temp file: {}", e),
            })?;

            file.write_all(serialized.as_bytes())
                .map_err(|e| StateError::SaveFailed {
                    reason: format!("Failed to write build: {}", e),
                })?;

            file.sync_all().map_err(|e| StateError::SaveFailed {
                reason: format!("Failed to sync file: {}", e),
            })?;
        }

        fs::rename(&temp_file_path, &build_path).map_err(|e| StateError::SaveFailed {
            reason: format!("Failed to rename temp file: {}", e),
        })?;

        log::debug!("Saved build #{} to {}", build.number, build_path.display());
        Ok(build_path)
    }

    /// Acquire the history lock using advisory locking (flock)
    async fn acquire_lock(&self) -> Result<HistoryLock> {
        let start_time = Instant::now();

        loop {
            let file = fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.lock_file_path)
                .map_err(|e| StateError::SaveFailed {
                    reason: format!("Failed to open lock file: {}", e),
                })?;

            if let Some(lock) = Self::try_lock(file)? {
                return Ok(lock);
            }

            if start_time.elapsed() >= self.lock_timeout {
                return Err(StateError::SaveFailed {
                    reason: "Timeout waiting for build history lock".to_string(),
                }
                .into());
            }
            log::debug!("Build history locked by another process, waiting...");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    #[cfg(unix)]
    fn try_lock(file: fs::File) -> Result<Option<HistoryLock>> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock_handle) => Ok(Some(HistoryLock {
                _lock_handle: lock_handle,
            })),
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
            Err((_, errno)) => Err(StateError::SaveFailed {
                reason: format!("flock error: {}", errno),
            }
            .into()),
        }
    }

    #[cfg(not(unix))]
    fn try_lock(file: fs::File) -> Result<Option<HistoryLock>> {
        Ok(Some(HistoryLock { _lock_handle: file }))
    }
}

impl BuildHistory for FileBuildHistory {
    fn previous_build(&self, number: u64) -> Result<Option<Build>> {
        match self.numbers()?.into_iter().rev().find(|&n| n < number) {
            Some(previous) => self.load(previous).map(Some),
            None => Ok(None),
        }
    }
}
