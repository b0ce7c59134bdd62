//! Branch state persisted across build runs.
//!
//! Every build run owns one [`BranchRecordStore`]. It is resolved at the start of the run
//! (cloned from the run itself, inherited from an earlier build, or created fresh) and
//! attached to the run's persisted result at the end so later runs can pick it up.

mod branch_record;
mod store;

pub use branch_record::{BranchRecord, BuildResult, DEFAULT_REMOTE_ALIAS};
pub use store::{
    BranchRecordStore, RemovalMode, ResolvedStore, RevisionResolver, STORE_FORMAT_VERSION,
    StoreOrigin, UnstableBranches, resolve_or_inherit,
};
