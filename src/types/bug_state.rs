//! Bug state targets and comparison values.
//!
//! A `BugState` pairs a status with an optional resolution. On the
//! expectation side (configured valid states, transition targets) either half
//! may be absent, in which case it acts as a wildcard. All comparisons are
//! case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (status, optional resolution) pair.
///
/// Used both as a comparison value ("the bug must be in one of these states")
/// and as a transition target ("move the bug to this state").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugState {
    /// Status name; `None` means "any status" when used as an expectation.
    pub status: Option<String>,
    /// Resolution name; `None` means "any resolution" when used as an
    /// expectation.
    pub resolution: Option<String>,
}

impl BugState {
    /// A state matching the given status with any resolution.
    pub fn status(status: impl Into<String>) -> Self {
        BugState {
            status: Some(status.into()),
            resolution: None,
        }
    }

    /// A state requiring both a status and a resolution.
    pub fn with_resolution(status: impl Into<String>, resolution: impl Into<String>) -> Self {
        BugState {
            status: Some(status.into()),
            resolution: Some(resolution.into()),
        }
    }

    /// A state matching any status with the given resolution.
    pub fn resolution_only(resolution: impl Into<String>) -> Self {
        BugState {
            status: None,
            resolution: Some(resolution.into()),
        }
    }

    /// Whether an observed (status, resolution) satisfies this expectation.
    ///
    /// An unset half of the expectation matches anything; a set half must
    /// match case-insensitively. An expected resolution is not satisfied by
    /// an unset observed resolution.
    pub fn permits(&self, status: Option<&str>, resolution: Option<&str>) -> bool {
        let status_ok = match &self.status {
            None => true,
            Some(want) => status.is_some_and(|s| s.eq_ignore_ascii_case(want)),
        };
        let resolution_ok = match &self.resolution {
            None => true,
            Some(want) => resolution.is_some_and(|r| r.eq_ignore_ascii_case(want)),
        };
        status_ok && resolution_ok
    }

    /// Whether two expectations describe the same state (case-insensitive on
    /// both halves). Used to de-duplicate configured state lists.
    pub fn same_as(&self, other: &BugState) -> bool {
        fn eq(a: &Option<String>, b: &Option<String>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
        }
        eq(&self.status, &other.status) && eq(&self.resolution, &other.resolution)
    }
}

impl fmt::Display for BugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.resolution) {
            (Some(s), Some(r)) => write!(f, "{s} ({r})"),
            (Some(s), None) => write!(f, "{s}"),
            (None, Some(r)) => write!(f, "any status with resolution {r}"),
            (None, None) => Ok(()),
        }
    }
}

/// Formats an observed (status, resolution) pair the same way a `BugState`
/// prints: `STATUS` or `STATUS (RESOLUTION)`.
pub fn pretty_state(status: Option<&str>, resolution: Option<&str>) -> String {
    match (status, resolution) {
        (Some(s), Some(r)) => format!("{s} ({r})"),
        (Some(s), None) => s.to_string(),
        (None, Some(r)) => format!("any status with resolution {r}"),
        (None, None) => String::new(),
    }
}

/// Joins a list of states for display: `MODIFIED, CLOSED (ERRATA)`.
pub fn pretty_states(states: &[BugState]) -> String {
    states
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_match_is_case_insensitive() {
        let expected = BugState::status("MODIFIED");
        assert!(expected.permits(Some("Modified"), None));
        assert!(expected.permits(Some("MODIFIED"), Some("ERRATA")));
        assert!(!expected.permits(Some("VERIFIED"), None));
        assert!(!expected.permits(None, None));
    }

    #[test]
    fn unset_resolution_is_a_wildcard() {
        let expected = BugState::status("CLOSED");
        assert!(expected.permits(Some("CLOSED"), Some("LOL_GO_AWAY")));
        assert!(expected.permits(Some("CLOSED"), None));
    }

    #[test]
    fn set_resolution_must_match() {
        let expected = BugState::with_resolution("CLOSED", "ERRATA");
        assert!(expected.permits(Some("Closed"), Some("Errata")));
        assert!(!expected.permits(Some("CLOSED"), Some("LOL_GO_AWAY")));
        assert!(!expected.permits(Some("CLOSED"), None));
    }

    #[test]
    fn resolution_only_matches_any_status() {
        let expected = BugState::resolution_only("ERRATA");
        assert!(expected.permits(Some("CLOSED"), Some("ERRATA")));
        assert!(expected.permits(Some("RESOLVED"), Some("errata")));
        assert!(!expected.permits(Some("CLOSED"), Some("WONTFIX")));
    }

    #[test]
    fn display_forms() {
        assert_eq!(BugState::status("MODIFIED").to_string(), "MODIFIED");
        assert_eq!(
            BugState::with_resolution("CLOSED", "ERRATA").to_string(),
            "CLOSED (ERRATA)"
        );
        assert_eq!(
            BugState::resolution_only("ERRATA").to_string(),
            "any status with resolution ERRATA"
        );
    }

    #[test]
    fn pretty_states_joins_with_commas() {
        let states = vec![
            BugState::status("MODIFIED"),
            BugState::with_resolution("CLOSED", "ERRATA"),
        ];
        assert_eq!(pretty_states(&states), "MODIFIED, CLOSED (ERRATA)");
    }

    #[test]
    fn same_as_compares_both_halves() {
        assert!(BugState::status("VERIFIED").same_as(&BugState::status("verified")));
        assert!(!BugState::status("VERIFIED").same_as(&BugState::status("MODIFIED")));
        assert!(
            !BugState::status("CLOSED").same_as(&BugState::with_resolution("CLOSED", "ERRATA"))
        );
    }

    proptest! {
        /// A state always permits the exact (status, resolution) it names.
        #[test]
        fn state_permits_itself(
            status in "[A-Za-z_]{1,12}",
            resolution in proptest::option::of("[A-Za-z_]{1,12}")
        ) {
            let state = BugState {
                status: Some(status.clone()),
                resolution: resolution.clone(),
            };
            prop_assert!(state.permits(Some(&status), resolution.as_deref()));
        }

        /// Case-flipping the observed status never changes the outcome.
        #[test]
        fn permits_ignores_case(status in "[a-z]{1,12}") {
            let expected = BugState::status(status.to_uppercase());
            prop_assert!(expected.permits(Some(&status), None));
        }
    }
}
