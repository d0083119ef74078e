//! The Jira collaborator trait.
//!
//! The engine only ever talks to Jira through this trait; the production
//! implementation wraps the HTTP client, and tests use the in-memory fake in
//! `test_utils`. Methods return `Option` for expected absences and reserve
//! `JiraError` for remote failures.

use std::future::Future;

use super::error::JiraError;
use super::issue::{Issue, IssueComment, IssueFields, RemoteLink, Transition};

/// Operations the engine needs from the Jira server.
///
/// All mutating operations must be safe to repeat: callers follow a
/// read-compare-mutate discipline, so a redundant delivery of the same event
/// converges instead of duplicating side effects.
pub trait JiraClient {
    /// The base URL of the server, used to build browse links.
    fn base_url(&self) -> &str;

    /// Fetches an issue by key or numeric ID. `Ok(None)` means the issue
    /// does not exist.
    fn get_issue(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<Issue>, JiraError>> + Send;

    /// Creates an issue and returns it with server-assigned ID and key.
    fn create_issue(
        &self,
        fields: IssueFields,
    ) -> impl Future<Output = Result<Issue, JiraError>> + Send;

    /// Replaces an issue's fields with the given record.
    fn update_issue(&self, issue: &Issue) -> impl Future<Output = Result<(), JiraError>> + Send;

    /// Lists the workflow transitions currently available on an issue.
    fn list_transitions(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<Transition>, JiraError>> + Send;

    /// Applies a transition by ID.
    fn apply_transition(
        &self,
        key: &str,
        transition_id: &str,
    ) -> impl Future<Output = Result<(), JiraError>> + Send;

    /// Lists the remote (external tracker) links on an issue.
    fn list_remote_links(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Vec<RemoteLink>, JiraError>> + Send;

    /// Adds a remote link. Callers check for an existing link with the same
    /// URL first.
    fn add_remote_link(
        &self,
        key: &str,
        link: &RemoteLink,
    ) -> impl Future<Output = Result<(), JiraError>> + Send;

    /// Removes the remote link with the given server-assigned ID.
    fn remove_remote_link(
        &self,
        key: &str,
        link_id: u64,
    ) -> impl Future<Output = Result<(), JiraError>> + Send;

    /// Adds a comment to an issue.
    fn add_comment(
        &self,
        key: &str,
        comment: &IssueComment,
    ) -> impl Future<Output = Result<(), JiraError>> + Send;
}
