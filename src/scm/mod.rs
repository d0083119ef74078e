//! Source-control collaborator: the engine's view of pull requests.
//!
//! The engine reads pull request state and mutates labels through this
//! trait; comments and retitles are not issued here, they are returned to
//! the caller as structured decisions for the presentation layer to render.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PrNumber, RepoId};

/// The fields of a pull request the engine cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: PrNumber,
    pub title: String,
    pub body: String,
    /// The base branch the pull request targets.
    pub base_ref: String,
    /// `open` or `closed`.
    pub state: String,
    pub merged: bool,
    pub html_url: String,
    /// The author's login.
    pub author: String,
}

/// A failure talking to the source-control host.
#[derive(Debug, Error)]
pub enum ScmError {
    #[error("pull request number {} does not exist", .number.0)]
    PullRequestNotFound { number: PrNumber },

    #[error("{message}")]
    Remote { message: String },
}

impl ScmError {
    pub fn remote(message: impl Into<String>) -> Self {
        ScmError::Remote {
            message: message.into(),
        }
    }
}

/// Operations the engine needs from the source-control host.
pub trait ScmClient {
    /// Fetches a pull request. `Ok(None)` means it does not exist.
    fn get_pull_request(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> impl Future<Output = Result<Option<PullRequest>, ScmError>> + Send;

    /// Lists the labels currently on a pull request.
    fn list_labels(
        &self,
        repo: &RepoId,
        number: PrNumber,
    ) -> impl Future<Output = Result<Vec<String>, ScmError>> + Send;

    /// Adds a label. Callers check the current label set first.
    fn add_label(
        &self,
        repo: &RepoId,
        number: PrNumber,
        label: &str,
    ) -> impl Future<Output = Result<(), ScmError>> + Send;

    /// Removes a label. Callers check the current label set first.
    fn remove_label(
        &self,
        repo: &RepoId,
        number: PrNumber,
        label: &str,
    ) -> impl Future<Output = Result<(), ScmError>> + Send;

    /// Whether the given label was applied by a human rather than the
    /// automation. A human-applied validity label is never removed.
    fn label_applied_by_human(
        &self,
        repo: &RepoId,
        number: PrNumber,
        label: &str,
    ) -> impl Future<Output = Result<bool, ScmError>> + Send;

    /// Finds the logins of users whose public email matches.
    fn search_users_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Vec<String>, ScmError>> + Send;
}

/// Builds the canonical URL for a pull request.
pub fn pull_request_url(repo: &RepoId, number: PrNumber) -> String {
    format!("https://github.com/{}/{}/pull/{}", repo.org, repo.repo, number.0)
}
