//! The Jira issue data model.
//!
//! This is a normalized view of the handful of fields the engine reads and
//! writes. Custom fields that Jira serves out of an untyped bag (target
//! versions, severity, the security level, the QA contact, the Bugzilla
//! bridge URL) are surfaced here as typed fields; the client implementation
//! owns the mapping.

use serde::{Deserialize, Serialize};

use crate::types::IssueKey;

/// A Jira issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The numeric issue ID, as a string (Jira serves it that way).
    pub id: String,
    pub key: IssueKey,
    pub fields: IssueFields,
}

impl Issue {
    /// The observed (status, resolution) pair.
    pub fn state(&self) -> (Option<&str>, Option<&str>) {
        (self.fields.status.as_deref(), self.fields.resolution.as_deref())
    }

    /// Whether the issue counts as open. A closed status is the only thing
    /// that makes an issue not-open; an absent status is treated as not open.
    pub fn is_open(&self) -> bool {
        self.fields
            .status
            .as_deref()
            .is_some_and(|s| !s.eq_ignore_ascii_case("CLOSED"))
    }

    /// The first entry of the multi-value target version field, if any.
    pub fn target_version(&self) -> Option<&str> {
        self.fields.target_versions.first().map(String::as_str)
    }
}

/// The fields of an issue the engine cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: String,
    pub description: Option<String>,
    /// Project key, e.g. `OCPBUGS`.
    pub project: Option<String>,
    /// Issue type name, e.g. `Bug`.
    pub issue_type: Option<String>,
    pub status: Option<String>,
    pub resolution: Option<String>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub affects_versions: Vec<String>,
    /// Multi-value target version custom field; the first entry wins.
    pub target_versions: Vec<String>,
    /// Severity custom field, when set.
    pub severity: Option<Severity>,
    /// Security level, when set. An unset level means the project default.
    pub security_level: Option<SecurityLevel>,
    /// QA contact custom field, when set.
    pub qa_contact: Option<QaContact>,
    /// URL of the Bugzilla bug this issue bridges, when the issue was created
    /// as a backport clone of a legacy-tracker bug.
    pub blocked_by_bugzilla_bug: Option<String>,
    pub comments: Vec<IssueComment>,
    pub links: Vec<IssueLink>,
}

/// The severity custom field. Jira serves the value as a decorated HTML
/// snippet (`<img …> Critical`); [`Severity::name`] strips the decoration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Severity {
    pub value: String,
}

impl Severity {
    pub fn new(value: impl Into<String>) -> Self {
        Severity { value: value.into() }
    }

    /// The bare severity name: the text after the final `>` of the decorated
    /// value, trimmed. A plain value is returned as-is.
    pub fn name(&self) -> &str {
        match self.value.rfind('>') {
            Some(idx) => self.value[idx + 1..].trim(),
            None => self.value.trim(),
        }
    }
}

/// An issue security level. Issues with a level outside a repository's
/// allow-list are invisible to the automation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityLevel {
    pub name: String,
}

/// The QA contact recorded on an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaContact {
    pub display_name: String,
    /// Public email address, used to locate the matching source-control user.
    pub email: Option<String>,
}

/// A comment on an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub body: String,
    /// Restricts who can see the comment; `None` means public.
    pub visibility: Option<CommentVisibility>,
}

impl IssueComment {
    pub fn public(body: impl Into<String>) -> Self {
        IssueComment {
            body: body.into(),
            visibility: None,
        }
    }

    /// A comment restricted to the internal employee group.
    pub fn private(body: impl Into<String>) -> Self {
        IssueComment {
            body: body.into(),
            visibility: Some(CommentVisibility::internal()),
        }
    }
}

/// Comment visibility restriction (`group`/`role` + value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentVisibility {
    pub kind: String,
    pub value: String,
}

impl CommentVisibility {
    pub fn internal() -> Self {
        CommentVisibility {
            kind: "group".to_string(),
            value: "Red Hat Employee".to_string(),
        }
    }
}

/// A typed link between two issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    pub link_type: IssueLinkType,
    /// The issue on the inward side of the relation, when it is not the
    /// issue this link was read from.
    pub inward_issue: Option<LinkedIssue>,
    /// The issue on the outward side of the relation, likewise.
    pub outward_issue: Option<LinkedIssue>,
}

impl IssueLink {
    /// `this clones other`, recorded on a newly created clone.
    pub fn clones(other: LinkedIssue) -> Self {
        IssueLink {
            link_type: IssueLinkType::cloners(),
            inward_issue: None,
            outward_issue: Some(other),
        }
    }

    /// `this is blocked by other`, recorded on a newly created clone.
    pub fn blocked_by(other: LinkedIssue) -> Self {
        IssueLink {
            link_type: IssueLinkType::blocks(),
            inward_issue: Some(other),
            outward_issue: None,
        }
    }

    pub fn is_clone_type(&self) -> bool {
        self.link_type.name.to_ascii_lowercase().starts_with("clone")
    }

    pub fn is_blocks_type(&self) -> bool {
        self.link_type.name.eq_ignore_ascii_case("blocks")
    }
}

/// The semantic type of an issue link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLinkType {
    pub name: String,
    pub inward: String,
    pub outward: String,
}

impl IssueLinkType {
    pub fn cloners() -> Self {
        IssueLinkType {
            name: "Cloners".to_string(),
            inward: "is cloned by".to_string(),
            outward: "clones".to_string(),
        }
    }

    pub fn blocks() -> Self {
        IssueLinkType {
            name: "Blocks".to_string(),
            inward: "is blocked by".to_string(),
            outward: "blocks".to_string(),
        }
    }
}

/// One endpoint of an issue link. Jira sometimes serves only the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedIssue {
    pub id: String,
    pub key: Option<IssueKey>,
}

impl LinkedIssue {
    pub fn by_id(id: impl Into<String>) -> Self {
        LinkedIssue {
            id: id.into(),
            key: None,
        }
    }

    pub fn new(id: impl Into<String>, key: IssueKey) -> Self {
        LinkedIssue {
            id: id.into(),
            key: Some(key),
        }
    }

    /// The best available reference for fetching this issue: the key when
    /// present, otherwise the numeric ID (Jira accepts both).
    pub fn reference(&self) -> &str {
        match &self.key {
            Some(key) => key.as_str(),
            None => &self.id,
        }
    }
}

/// A remote (external tracker) link on an issue. Identity for diffing
/// purposes is the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLink {
    /// Server-assigned ID; absent on links the engine is about to create.
    pub id: Option<u64>,
    pub url: String,
    pub title: String,
    pub icon: Option<RemoteLinkIcon>,
}

/// Icon metadata on a remote link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLinkIcon {
    pub url_16x16: String,
    pub title: String,
}

impl RemoteLinkIcon {
    pub fn github() -> Self {
        RemoteLinkIcon {
            url_16x16: "https://github.com/favicon.ico".to_string(),
            title: "GitHub".to_string(),
        }
    }
}

/// A workflow transition available on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    /// The status the issue lands in after taking this transition.
    pub target_status: String,
}
