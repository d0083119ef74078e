//! Core domain types for the lifecycle engine.
//!
//! This module contains the fundamental types used throughout the crate,
//! designed to encode invariants via the type system.

pub mod bug_state;
pub mod ids;
pub mod options;

// Re-export commonly used types at the module level
pub use bug_state::{BugState, pretty_state, pretty_states};
pub use ids::{BUG_PROJECT, BugzillaBugId, IssueKey, NO_ISSUE_KEY, PrNumber, RepoId};
pub use options::BranchOptions;
