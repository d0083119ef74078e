//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., using a
//! Bugzilla bug ID where a Jira issue key is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The Jira project that holds defect tickets. Issues in any other project are
/// tracked as references only and never validated as bugs.
pub const BUG_PROJECT: &str = "OCPBUGS";

/// The sentinel key used when a title explicitly declares that no issue is
/// associated with the change (`NO-ISSUE:` / `NO-JIRA:` prefixes).
pub const NO_ISSUE_KEY: &str = "NO-JIRA";

/// A Jira issue key (`PROJECT-123`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKey(pub String);

impl IssueKey {
    pub fn new(s: impl Into<String>) -> Self {
        IssueKey(s.into())
    }

    /// The sentinel "no ticket requested" key.
    pub fn no_issue() -> Self {
        IssueKey(NO_ISSUE_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_no_issue(&self) -> bool {
        self.0 == NO_ISSUE_KEY
    }

    /// The project portion of the key (everything before the first `-`).
    pub fn project(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Whether this key belongs to the given project (case-insensitive).
    pub fn in_project(&self, project: &str) -> bool {
        self.project().eq_ignore_ascii_case(project)
    }

    /// Whether this key belongs to the defect project.
    pub fn is_bug_key(&self) -> bool {
        self.in_project(BUG_PROJECT)
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IssueKey {
    fn from(s: &str) -> Self {
        IssueKey(s.to_string())
    }
}

impl From<String> for IssueKey {
    fn from(s: String) -> Self {
        IssueKey(s)
    }
}

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// A numeric Bugzilla bug ID in the legacy tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BugzillaBugId(pub u64);

impl fmt::Display for BugzillaBugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BugzillaBugId {
    fn from(n: u64) -> Self {
        BugzillaBugId(n)
    }
}

/// A repository identifier (org/repo format).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub org: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            org: org.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}
