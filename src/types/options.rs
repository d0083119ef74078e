//! Per-branch policy options.
//!
//! The engine consumes an already-resolved `BranchOptions` record; loading
//! and per-org/repo/branch inheritance are the configuration layer's concern.
//! Every predicate is optional: an absent predicate is neither a pass nor a
//! fail, it is simply not evaluated.

use serde::{Deserialize, Serialize};

use super::bug_state::BugState;

/// Policy options resolved for a single (org, repo, branch) tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOptions {
    /// If set, the bug must be open (`true`) or not open (`false`).
    pub is_open: Option<bool>,

    /// If set, the bug's first target version must equal this version.
    pub target_version: Option<String>,

    /// If set, the bug must be in one of these states. The
    /// `state_after_validation` target is implicitly part of the set.
    pub valid_states: Option<Vec<BugState>>,

    /// If set, every dependent bug must be in one of these states.
    pub dependent_bug_states: Option<Vec<BugState>>,

    /// If set, every dependent bug must target one of these versions.
    pub dependent_bug_target_versions: Option<Vec<String>>,

    /// State to move the bug to once it validates.
    pub state_after_validation: Option<BugState>,

    /// State to move the bug to once every linked pull request has merged.
    pub state_after_merge: Option<BugState>,

    /// State to reset the bug to when its last linked pull request is closed
    /// without merging.
    pub state_after_close: Option<BugState>,

    /// Whether to record an external tracker link for the pull request.
    pub add_external_link: Option<bool>,

    /// Security levels automation may act on. Empty means unrestricted.
    pub allowed_security_levels: Vec<String>,

    /// Whether pull requests without a recognizable reference are still
    /// digested (and reported as missing a reference).
    pub validate_by_default: Option<bool>,
}

impl BranchOptions {
    /// Whether any dependent-bug predicate is configured.
    pub fn expects_dependents(&self) -> bool {
        self.dependent_bug_states.is_some() || self.dependent_bug_target_versions.is_some()
    }

    /// The set of states the bug is expected to occupy before a post-merge
    /// transition: the configured valid states plus the post-validation
    /// target, de-duplicated. Empty when neither is configured, which
    /// disables the premerge state check.
    pub fn premerge_states(&self) -> Vec<BugState> {
        let mut states = self.valid_states.clone().unwrap_or_default();
        if let Some(after) = &self.state_after_validation
            && !states.iter().any(|s| s.same_as(after))
        {
            states.push(after.clone());
        }
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_options_expect_no_dependents() {
        assert!(!BranchOptions::default().expects_dependents());
    }

    #[test]
    fn either_dependent_predicate_expects_dependents() {
        let states = BranchOptions {
            dependent_bug_states: Some(vec![BugState::status("VERIFIED")]),
            ..Default::default()
        };
        assert!(states.expects_dependents());

        let versions = BranchOptions {
            dependent_bug_target_versions: Some(vec!["v2".to_string()]),
            ..Default::default()
        };
        assert!(versions.expects_dependents());
    }

    #[test]
    fn premerge_states_include_the_post_validation_target_without_duplicates() {
        let options = BranchOptions {
            valid_states: Some(vec![BugState::status("MODIFIED")]),
            state_after_validation: Some(BugState::status("modified")),
            ..Default::default()
        };
        assert_eq!(options.premerge_states(), vec![BugState::status("MODIFIED")]);

        let options = BranchOptions {
            valid_states: Some(vec![BugState::status("MODIFIED")]),
            state_after_validation: Some(BugState::status("UPDATED")),
            ..Default::default()
        };
        assert_eq!(
            options.premerge_states(),
            vec![BugState::status("MODIFIED"), BugState::status("UPDATED")]
        );
    }

    #[test]
    fn premerge_states_empty_when_nothing_configured() {
        let options = BranchOptions {
            state_after_merge: Some(BugState::with_resolution("CLOSED", "MERGED")),
            state_after_close: Some(BugState::status("NEW")),
            ..Default::default()
        };
        assert!(options.premerge_states().is_empty());
    }
}
