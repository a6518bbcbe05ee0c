//! Git-backed change tracking for the tree.

mod git;

pub use git::{ChangeTracker, changed_packages};
