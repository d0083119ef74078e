//! Issue reference extraction from pull request titles.
//!
//! A reference is `PROJECT-NUMBER:` with the colon immediately following the
//! number; a space before the colon disqualifies the match. The first match
//! in the text wins, which makes `Revert: "OCPBUGS-12: …"` resolve to the
//! reverting issue when one is present and to the reverted issue otherwise.
//! A `NO-ISSUE:`/`NO-JIRA:` prefix short-circuits to the sentinel key.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{BugzillaBugId, IssueKey};

static ISSUE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(NO-ISSUE|NO-JIRA|([A-Za-z][A-Za-z0-9]*)-([0-9]+)):")
        .expect("issue reference pattern must compile")
});

static LEGACY_BUG_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbug\s+([0-9]+):").expect("legacy bug reference pattern must compile")
});

/// The outcome of scanning a title for an issue reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleReference {
    /// No parseable reference at all.
    Missing,
    /// The title explicitly declares that no issue applies.
    NoIssue,
    /// A concrete issue key, with its defect-project classification.
    Key { key: IssueKey, is_bug: bool },
}

/// Extracts the issue reference from free text (a PR title, usually).
///
/// The returned key is upper-cased; `is_bug` is true exactly when the
/// referenced project is the defect project.
pub fn issue_key_from_title(title: &str) -> TitleReference {
    let Some(captures) = ISSUE_REFERENCE.captures(title) else {
        return TitleReference::Missing;
    };
    let (Some(project), Some(number)) = (captures.get(2), captures.get(3)) else {
        // Matched one of the explicit no-issue markers.
        return TitleReference::NoIssue;
    };
    let key = IssueKey::new(format!(
        "{}-{}",
        project.as_str().to_ascii_uppercase(),
        number.as_str()
    ));
    let is_bug = key.is_bug_key();
    TitleReference::Key { key, is_bug }
}

/// Extracts a legacy `Bug NNN:` reference, used for bridging backports of
/// changes originally tracked in the legacy tracker. The same first-match
/// and space-before-colon rules apply.
pub fn legacy_bug_from_title(title: &str) -> Option<BugzillaBugId> {
    let captures = LEGACY_BUG_REFERENCE.captures(title)?;
    captures[1].parse::<u64>().ok().map(BugzillaBugId)
}
