//! Branch record store carried from one build run to the next.

use crate::build::BuildHistory;
use crate::data::{BranchRecord, BuildResult};
use crate::error::Result;
use crate::git::GitOperations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

/// Current version of the store format
pub const STORE_FORMAT_VERSION: u32 = 1;

/// How a record leaves the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMode {
    /// Keep the record as an inactive tombstone for audit
    Soft,
    /// Erase the record entirely
    Hard,
}

/// Collection of branch records keyed by branch name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecordStore {
    /// Version of the store format
    pub format_version: u32,
    /// Whether the run owning this store is a Dry Run
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    records: BTreeMap<String, BranchRecord>,
}

impl Default for BranchRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            format_version: STORE_FORMAT_VERSION,
            dry_run: false,
            records: BTreeMap::new(),
        }
    }

    /// Active record for a branch
    pub fn get(&self, branch_name: &str) -> Option<&BranchRecord> {
        self.records.get(branch_name).filter(|r| !r.is_removed())
    }

    /// Mutable active record for a branch
    pub fn get_mut(&mut self, branch_name: &str) -> Option<&mut BranchRecord> {
        self.records
            .get_mut(branch_name)
            .filter(|r| !r.is_removed())
    }

    /// Return the active record for a branch, inserting an empty one if there is none.
    ///
    /// A tombstone with the same name is replaced: the branch was deleted and created again.
    pub fn get_or_add(&mut self, branch_name: &str) -> &mut BranchRecord {
        let record = self
            .records
            .entry(branch_name.to_string())
            .or_insert_with(|| BranchRecord::new(branch_name));
        if record.is_removed() {
            *record = BranchRecord::with_remote(record.remote_alias.clone(), branch_name);
        }
        record
    }

    /// Like [`get_or_add`](Self::get_or_add) for a branch on a specific remote
    pub fn get_or_add_remote(&mut self, remote_alias: &str, branch_name: &str) -> &mut BranchRecord {
        let record = self.get_or_add(branch_name);
        record.remote_alias = remote_alias.to_string();
        record
    }

    /// Whether an active record exists for the branch
    pub fn contains(&self, branch_name: &str) -> bool {
        self.get(branch_name).is_some()
    }

    /// Remove the record of a branch
    pub fn remove(&mut self, branch_name: &str, mode: RemovalMode) {
        match mode {
            RemovalMode::Hard => {
                self.records.remove(branch_name);
            }
            RemovalMode::Soft => {
                if let Some(record) = self.records.get_mut(branch_name)
                    && !record.is_removed()
                {
                    record.removed_at = Some(Utc::now());
                }
            }
        }
    }

    /// Remove the records of several branches
    pub fn remove_all<I, S>(&mut self, branch_names: I, mode: RemovalMode)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in branch_names {
            self.remove(name.as_ref(), mode);
        }
    }

    /// Erase tombstones removed before `cutoff`, returning their branch names
    pub fn purge_tombstones(&mut self, cutoff: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .tombstones()
            .filter(|r| r.removed_at().is_some_and(|at| at < cutoff))
            .map(|r| r.branch_name().to_string())
            .collect();
        self.remove_all(&expired, RemovalMode::Hard);
        expired
    }

    /// Active records in branch name order
    pub fn records(&self) -> impl Iterator<Item = &BranchRecord> {
        self.records.values().filter(|r| !r.is_removed())
    }

    /// Soft-removed records kept for audit
    pub fn tombstones(&self) -> impl Iterator<Item = &BranchRecord> {
        self.records.values().filter(|r| r.is_removed())
    }

    /// Number of active records
    pub fn len(&self) -> usize {
        self.records().count()
    }

    /// Whether the store has no active records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group active records whose last result is strictly worse than `baseline`
    pub fn group_unstable_by_result(&self, baseline: BuildResult) -> UnstableBranches {
        let mut grouped: BTreeMap<BuildResult, Vec<BranchRecord>> = BTreeMap::new();
        for record in self.records() {
            if let Some(result) = record.last_build_result
                && result.is_worse_than(baseline)
            {
                grouped.entry(result).or_default().push(record.clone());
            }
        }
        UnstableBranches(grouped)
    }

    /// Soft-remove every active record whose remote head no longer resolves.
    ///
    /// Returns the names of the pruned branches.
    pub async fn prune_unresolvable<R>(&mut self, resolver: &R) -> Result<Vec<String>>
    where
        R: RevisionResolver,
    {
        let names: Vec<String> = self.records().map(|r| r.branch_name().to_string()).collect();
        let mut pruned = Vec::new();
        for name in names {
            if resolver.resolve_head_rev(&name).await?.is_none() {
                pruned.push(name);
            }
        }
        self.remove_all(&pruned, RemovalMode::Soft);
        Ok(pruned)
    }
}

/// Records grouped by a result worse than the passing baseline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnstableBranches(BTreeMap<BuildResult, Vec<BranchRecord>>);

impl UnstableBranches {
    /// Whether no branch is unstable
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Branches recorded with the given result
    pub fn get(&self, result: BuildResult) -> Option<&[BranchRecord]> {
        self.0.get(&result).map(Vec::as_slice)
    }

    /// Iterate the groups from least to most severe
    pub fn iter(&self) -> impl Iterator<Item = (&BuildResult, &Vec<BranchRecord>)> {
        self.0.iter()
    }
}

impl fmt::Display for UnstableBranches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (result, records)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let names: Vec<&str> = records.iter().map(|r| r.branch_name()).collect();
            write!(f, "{}=[{}]", result, names.join(", "))?;
        }
        f.write_str("}")
    }
}

/// Resolves the current head revision of a remote branch
pub trait RevisionResolver {
    /// Commit id of the branch head on the remote, `None` if the branch does not exist
    fn resolve_head_rev(&self, branch_name: &str) -> impl Future<Output = Result<Option<String>>>;
}

impl<G: GitOperations> RevisionResolver for G {
    async fn resolve_head_rev(&self, branch_name: &str) -> Result<Option<String>> {
        self.get_head_rev(branch_name).await
    }
}

/// Where the store of a run came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOrigin {
    /// The run already carried a store
    Current,
    /// Cloned from an earlier build and pruned
    Inherited {
        /// Number of the build the store was cloned from
        build_number: u64,
        /// Branches pruned because their remote ref is gone
        pruned: Vec<String>,
    },
    /// No earlier build carried a store
    Fresh,
}

/// Store resolved for a run, with its origin
#[derive(Debug, Clone)]
pub struct ResolvedStore {
    /// The owned store for this run
    pub store: BranchRecordStore,
    /// Where it came from
    pub origin: StoreOrigin,
}

/// Resolve the store for build `build_number`.
///
/// A store already attached to the run is cloned. Otherwise the history is walked
/// backward and the first store found is cloned and pruned of branches that no longer
/// exist on the remote. Without any earlier store a fresh one is created.
pub async fn resolve_or_inherit<H, R>(
    current: Option<&BranchRecordStore>,
    history: &H,
    build_number: u64,
    resolver: &R,
) -> Result<ResolvedStore>
where
    H: BuildHistory + ?Sized,
    R: RevisionResolver,
{
    if let Some(store) = current {
        return Ok(ResolvedStore {
            store: store.clone(),
            origin: StoreOrigin::Current,
        });
    }

    match history.previous_store(build_number)? {
        Some((previous_number, previous)) => {
            // History hands out an owned copy, so the earlier build's store is never shared.
            let mut store = previous;
            let pruned = store.prune_unresolvable(resolver).await?;
            if !pruned.is_empty() {
                log::info!(
                    "Dropped records of deleted branches inherited from build #{}: {}",
                    previous_number,
                    pruned.join(", ")
                );
            }
            Ok(ResolvedStore {
                store,
                origin: StoreOrigin::Inherited {
                    build_number: previous_number,
                    pruned,
                },
            })
        }
        None => Ok(ResolvedStore {
            store: BranchRecordStore::new(),
            origin: StoreOrigin::Fresh,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(results: &[(&str, Option<BuildResult>)]) -> BranchRecordStore {
        let mut store = BranchRecordStore::new();
        for (name, result) in results {
            store.get_or_add(name).last_build_result = *result;
        }
        store
    }

    #[test]
    fn test_get_or_add_is_idempotent() {
        let mut store = BranchRecordStore::new();
        store.get_or_add("develop").last_build_version = Some("1.1-SNAPSHOT".to_string());
        let again = store.get_or_add("develop");
        assert_eq!(again.last_build_version.as_deref(), Some("1.1-SNAPSHOT"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = BranchRecordStore::new();
        assert!(store.get("develop").is_none());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = store_with(&[("develop", Some(BuildResult::Success))]);
        let mut cloned = original.clone();
        let record = cloned.get_or_add("develop");
        record.last_build_result = Some(BuildResult::Failure);
        record.last_build_version = Some("2.0-SNAPSHOT".to_string());
        cloned.get_or_add("release/1.0");

        let develop = original.get("develop").expect("develop record");
        assert_eq!(develop.last_build_result, Some(BuildResult::Success));
        assert_eq!(develop.last_build_version, None);
        assert!(original.get("release/1.0").is_none());
    }

    #[test]
    fn test_soft_remove_keeps_tombstone() {
        let mut store = store_with(&[("release/1.0", Some(BuildResult::Success))]);
        store.remove("release/1.0", RemovalMode::Soft);

        assert!(store.get("release/1.0").is_none());
        assert_eq!(store.len(), 0);
        let tombstones: Vec<_> = store.tombstones().collect();
        assert_eq!(tombstones.len(), 1);
        assert_eq!(tombstones[0].last_build_result, Some(BuildResult::Success));
        assert!(tombstones[0].removed_at().is_some());
    }

    #[test]
    fn test_hard_remove_erases() {
        let mut store = store_with(&[("release/1.0", Some(BuildResult::Success))]);
        store.remove("release/1.0", RemovalMode::Hard);
        assert!(store.get("release/1.0").is_none());
        assert_eq!(store.tombstones().count(), 0);
    }

    #[test]
    fn test_purge_tombstones_before_cutoff() {
        let mut store = store_with(&[
            ("feature/old", Some(BuildResult::Success)),
            ("feature/recent", Some(BuildResult::Failure)),
            ("develop", Some(BuildResult::Success)),
        ]);
        store.remove_all(["feature/old", "feature/recent"], RemovalMode::Soft);
        let now = Utc::now();
        if let Some(record) = store.records.get_mut("feature/old") {
            record.removed_at = Some(now - chrono::Duration::days(40));
        }

        let purged = store.purge_tombstones(now - chrono::Duration::days(30));

        assert_eq!(purged, vec!["feature/old".to_string()]);
        let tombstones: Vec<_> = store.tombstones().map(|r| r.branch_name()).collect();
        assert_eq!(tombstones, ["feature/recent"]);
        assert!(store.contains("develop"));
    }

    #[test]
    fn test_get_or_add_replaces_tombstone() {
        let mut store = store_with(&[("release/1.0", Some(BuildResult::Failure))]);
        store.remove("release/1.0", RemovalMode::Soft);
        let record = store.get_or_add("release/1.0");
        assert!(!record.is_removed());
        assert_eq!(record.last_build_result, None);
        assert_eq!(store.tombstones().count(), 0);
    }

    #[test]
    fn test_group_unstable_by_result() {
        let store = store_with(&[
            ("develop", Some(BuildResult::Failure)),
            ("master", Some(BuildResult::Success)),
            ("release/1.0", Some(BuildResult::Unstable)),
            ("feature/login", None),
        ]);
        let grouped = store.group_unstable_by_result(BuildResult::Success);

        assert!(!grouped.is_empty());
        assert_eq!(grouped.get(BuildResult::Failure).map(<[_]>::len), Some(1));
        assert_eq!(grouped.get(BuildResult::Unstable).map(<[_]>::len), Some(1));
        assert!(grouped.get(BuildResult::Success).is_none());
        assert_eq!(
            grouped.to_string(),
            "{UNSTABLE=[release/1.0], FAILURE=[develop]}"
        );
    }

    #[test]
    fn test_group_ignores_tombstones() {
        let mut store = store_with(&[("hotfix/1.0", Some(BuildResult::Failure))]);
        store.remove("hotfix/1.0", RemovalMode::Soft);
        assert!(store.group_unstable_by_result(BuildResult::Success).is_empty());
    }

    #[test]
    fn test_store_json_keeps_records() {
        let mut store = store_with(&[("develop", Some(BuildResult::Success))]);
        store.dry_run = true;
        let json = serde_json::to_string(&store).expect("serialize");
        let loaded: BranchRecordStore = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(loaded, store);
    }
}
