//! Git capability used by the Gitflow actions.
//!
//! The actions only depend on the [`GitOperations`] trait; [`GitCli`] is the
//! implementation the binary uses.

mod cli_adapter;
mod operations;

pub use cli_adapter::GitCli;
pub use operations::{GitOperations, Refspec};
