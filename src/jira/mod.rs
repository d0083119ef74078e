//! Jira data model and collaborator trait.

pub mod client;
pub mod error;
pub mod issue;

pub use client::JiraClient;
pub use error::JiraError;
pub use issue::{
    CommentVisibility, Issue, IssueComment, IssueFields, IssueLink, IssueLinkType, LinkedIssue,
    QaContact, RemoteLink, RemoteLinkIcon, SecurityLevel, Severity, Transition,
};

/// Builds a browse URL for an issue key.
pub fn browse_url(base_url: &str, key: &str) -> String {
    format!("{}/browse/{}", base_url.trim_end_matches('/'), key)
}
