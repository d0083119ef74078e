//! Pull request label management.
//!
//! Label names match the ones the wider automation suite keys on. Every
//! mutation goes through a read-compare-apply diff so redundant deliveries
//! of the same event leave the label set untouched.

use crate::jira::Severity;
use crate::scm::{ScmClient, ScmError};
use crate::types::{PrNumber, RepoId};

use super::report::LabelDiff;

/// The title references a parseable issue.
pub const VALID_REFERENCE: &str = "jira/valid-reference";
/// The referenced bug passed every configured predicate.
pub const VALID_BUG: &str = "jira/valid-bug";
/// The referenced bug failed at least one predicate.
pub const INVALID_BUG: &str = "jira/invalid-bug";
/// Kept in lockstep with [`VALID_BUG`] for tooling that still keys on the
/// legacy tracker's label.
pub const LEGACY_VALID_BUG: &str = "bugzilla/valid-bug";

pub const SEVERITY_CRITICAL: &str = "jira/severity-critical";
pub const SEVERITY_IMPORTANT: &str = "jira/severity-important";
pub const SEVERITY_MODERATE: &str = "jira/severity-moderate";
pub const SEVERITY_LOW: &str = "jira/severity-low";

const SEVERITY_LABELS: [&str; 4] = [
    SEVERITY_CRITICAL,
    SEVERITY_IMPORTANT,
    SEVERITY_MODERATE,
    SEVERITY_LOW,
];

/// Maps a severity field value to its label, if the severity is recognized.
pub fn severity_label(severity: &Severity) -> Option<&'static str> {
    match severity.name().to_ascii_lowercase().as_str() {
        "critical" => Some(SEVERITY_CRITICAL),
        "important" => Some(SEVERITY_IMPORTANT),
        "moderate" => Some(SEVERITY_MODERATE),
        "low" => Some(SEVERITY_LOW),
        _ => None,
    }
}

/// The label changes a pass wants, before diffing against the current set.
#[derive(Debug, Clone, Default)]
pub struct DesiredLabels {
    pub add: Vec<&'static str>,
    pub remove: Vec<&'static str>,
}

impl DesiredLabels {
    /// Labels for a reference to a non-defect issue (or the explicit
    /// no-issue sentinel): the reference label only, stale validity labels
    /// dropped.
    pub fn reference_only() -> Self {
        DesiredLabels {
            add: vec![VALID_REFERENCE],
            remove: vec![VALID_BUG, LEGACY_VALID_BUG, INVALID_BUG],
        }
    }

    /// Labels for a bug that validated, with its severity label when the
    /// severity is known.
    pub fn valid(severity: Option<&'static str>) -> Self {
        let mut add = vec![VALID_REFERENCE, VALID_BUG, LEGACY_VALID_BUG];
        let mut remove = vec![INVALID_BUG];
        stale_severity(&mut add, &mut remove, severity);
        DesiredLabels { add, remove }
    }

    /// Labels for a bug that failed validation. `retain_valid` keeps a
    /// human-applied valid-bug label in place.
    pub fn invalid(severity: Option<&'static str>, retain_valid: bool) -> Self {
        let mut add = vec![VALID_REFERENCE, INVALID_BUG];
        let mut remove = Vec::new();
        if !retain_valid {
            remove.push(VALID_BUG);
            remove.push(LEGACY_VALID_BUG);
        }
        stale_severity(&mut add, &mut remove, severity);
        DesiredLabels { add, remove }
    }
}

fn stale_severity(
    add: &mut Vec<&'static str>,
    remove: &mut Vec<&'static str>,
    severity: Option<&'static str>,
) {
    for label in SEVERITY_LABELS {
        if Some(label) == severity {
            add.push(label);
        } else {
            remove.push(label);
        }
    }
}

/// Applies desired labels to a pull request, mutating only on mismatch, and
/// returns the changes actually made.
pub async fn apply_labels<S: ScmClient>(
    scm: &S,
    repo: &RepoId,
    number: PrNumber,
    desired: &DesiredLabels,
) -> Result<LabelDiff, ScmError> {
    let current = scm.list_labels(repo, number).await?;
    let mut diff = LabelDiff::default();
    for label in &desired.add {
        if !current.iter().any(|l| l == label) {
            scm.add_label(repo, number, label).await?;
            diff.add.push(label.to_string());
        }
    }
    for label in &desired.remove {
        if current.iter().any(|l| l == label) {
            scm.remove_label(repo, number, label).await?;
            diff.remove.push(label.to_string());
        }
    }
    Ok(diff)
}
