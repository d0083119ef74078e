//! The structured decision object produced by a reconciliation pass.
//!
//! The engine never renders markdown. It reports what it decided and what it
//! changed as typed sections; the presentation layer owns the exact wording
//! of everything except the validation strings, which are part of the
//! validity engine's contract.

use serde::{Deserialize, Serialize};

use crate::types::{BugState, BugzillaBugId, IssueKey, PrNumber, RepoId};

/// A pull request referenced from a tracker-side external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPr {
    pub repo: RepoId,
    pub number: PrNumber,
    /// Canonical pull request URL.
    pub url: String,
}

/// An unmerged linked pull request, with its state for the progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmergedPr {
    pub pr: LinkedPr,
    /// `open` or `closed`.
    pub state: String,
}

/// The ticket a backport was cloned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneSource {
    Jira(IssueKey),
    Bugzilla(BugzillaBugId),
}

/// One section of the user-facing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    /// The title referenced no issue and the user asked for a refresh.
    NoIssueReferenced,

    /// A command was issued on a plain issue rather than a pull request.
    NotAPullRequest,

    /// The referenced issue does not exist in the tracker.
    IssueNotFound { key: IssueKey },

    /// The referenced legacy bug does not exist in the tracker.
    LegacyBugNotFound { id: BugzillaBugId },

    /// The issue sits in a security level the automation may not act on.
    SecurityLevelDisallowed {
        key: IssueKey,
        allowed: Vec<String>,
    },

    /// The issue passed every configured predicate.
    Valid {
        key: IssueKey,
        validations: Vec<String>,
        /// The state the issue was moved to, when a post-validation
        /// transition actually ran.
        moved_to: Option<BugState>,
        /// Whether an external link to the pull request was recorded.
        external_link_added: bool,
    },

    /// The issue failed at least one predicate.
    Invalid {
        key: IssueKey,
        reasons: Vec<String>,
        /// A human applied the valid-bug label, so it was retained.
        retained_human_label: bool,
        /// A dependent lives outside the required project; the renderer adds
        /// backport guidance for this case.
        dependent_project_violation: bool,
    },

    /// A QA review was requested from the resolved contact.
    QaReviewRequested { login: String },

    /// The issue names no QA contact to request a review from.
    QaContactMissing { key: IssueKey },

    /// No source-control user matches the QA contact's email.
    QaContactNotFound { email: String },

    /// Several source-control users match the QA contact's email.
    QaContactAmbiguous {
        email: String,
        logins: Vec<String>,
    },

    /// Every linked pull request has merged.
    MergeCompleted {
        key: IssueKey,
        merged: Vec<LinkedPr>,
        /// The post-merge state, when the transition actually ran.
        moved_to: Option<BugState>,
    },

    /// Some linked pull requests have not merged; the transition was
    /// withheld.
    MergeIncomplete {
        key: IssueKey,
        merged: Vec<LinkedPr>,
        unmerged: Vec<UnmergedPr>,
        withheld: BugState,
    },

    /// The issue is in a state the branch does not recognize, so the
    /// post-merge transition was withheld.
    PremergeUnrecognizedState {
        key: IssueKey,
        current: String,
        withheld: BugState,
    },

    /// The closing pull request's external link was removed.
    LinkRemoved {
        key: IssueKey,
        /// Whether that was the last pull request link on the issue.
        all_links_closed: bool,
        /// The state the issue was reset to, when a post-close transition
        /// actually ran.
        state_reset: Option<BugState>,
    },

    /// A new clone was created for a backport.
    CloneCreated {
        source: CloneSource,
        clone: IssueKey,
    },

    /// An existing clone with the right target version was reused.
    CloneReused {
        source: IssueKey,
        clone: IssueKey,
    },
}

/// Labels to apply to the pull request. Only actual changes are listed; a
/// label already present is never re-added, one already absent never
/// re-removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDiff {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LabelDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// External links changed on the tracker side, by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Everything one reconciliation pass decided and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub sections: Vec<Section>,
    pub labels: LabelDiff,
    pub links: LinkDiff,
    /// A structured `/retitle` command for the downstream command processor.
    pub retitle: Option<String>,
    /// Non-fatal problems, e.g. an ancillary update that failed during an
    /// otherwise successful clone.
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    /// Whether the pass decided nothing at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
            && self.labels.is_empty()
            && self.links.added.is_empty()
            && self.links.removed.is_empty()
            && self.retitle.is_none()
            && self.warnings.is_empty()
    }
}
