//! Canonical event digestion.
//!
//! Webhook payloads arrive as typed records (the transport layer owns JSON
//! parsing and signature checks) and are digested into a canonical [`Event`],
//! or into nothing when no reconciliation is warranted. The digester is
//! where no-op title edits are suppressed and slash commands are recognized.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::{
    TitleReference, backport_source, issue_key_from_title, parse_commands,
};
use crate::scm::{ScmClient, ScmError};
use crate::types::{IssueKey, PrNumber, RepoId};

/// Actions on a pull request the engine reacts to. Anything else digests to
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    Opened,
    Edited,
    Closed,
    #[serde(other)]
    Other,
}

/// A pull request webhook payload, reduced to the fields the digester reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PrAction,
    pub repo: RepoId,
    pub number: PrNumber,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub base_ref: String,
    /// `open` or `closed`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub merged: bool,
    pub html_url: String,
    pub author: String,
    /// The edit delta, when the payload carries one.
    #[serde(default)]
    pub changes: Option<Changes>,
}

/// The `changes` object of an edited payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default)]
    pub title: Option<ChangedFrom>,
}

/// A single changed field, carrying its previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFrom {
    pub from: String,
}

/// Comment actions. Only `created` produces events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
    #[serde(other)]
    Other,
}

/// An issue-comment webhook payload, reduced to the fields the digester
/// reads. Comments on the conversation tab of a pull request arrive as issue
/// comments; `is_pull_request` distinguishes them from plain issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub repo: RepoId,
    pub number: PrNumber,
    pub is_pull_request: bool,
    pub body: String,
    pub html_url: String,
    pub author: String,
}

/// The canonical intent derived from a webhook delivery, consumed by a
/// single reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub repo: RepoId,
    pub base_ref: String,
    pub number: PrNumber,
    /// The referenced issue key; the explicit no-issue sentinel is a real
    /// key here. `None` exactly when `missing` is set.
    pub key: Option<IssueKey>,
    /// Whether the referenced issue belongs to the defect project.
    pub is_bug: bool,
    /// The title or comment referenced no parseable issue.
    pub missing: bool,
    /// Pull request state as reported by the payload.
    pub state: String,
    pub opened: bool,
    pub merged: bool,
    pub closed: bool,
    pub refresh: bool,
    pub cc_qa: bool,
    /// The pull request is a backport (marker in the body, or an explicit
    /// cherrypick command).
    pub cherrypick: bool,
    /// The backport was requested via `/jira cherrypick`.
    pub cherrypick_cmd: bool,
    /// The source pull request of a marker-detected backport.
    pub cherrypick_from_pr: Option<PrNumber>,
    pub body: String,
    pub title: String,
    pub html_url: String,
    pub login: String,
}

impl Event {
    /// Applies a parsed title reference to the key-related fields.
    fn set_reference(&mut self, reference: TitleReference) {
        match reference {
            TitleReference::Missing => {
                self.key = None;
                self.is_bug = false;
                self.missing = true;
            }
            TitleReference::NoIssue => {
                self.key = Some(IssueKey::no_issue());
                self.is_bug = false;
                self.missing = false;
            }
            TitleReference::Key { key, is_bug } => {
                self.key = Some(key);
                self.is_bug = is_bug;
                self.missing = false;
            }
        }
    }
}

/// Digests a pull request payload. Returns `None` when no reconciliation is
/// warranted: unhandled actions, titles without a reference (unless the
/// branch validates by default or the PR is a detected backport), and title
/// edits that do not change the referenced issue.
pub fn digest_pr(payload: &PullRequestEvent, validate_by_default: Option<bool>) -> Option<Event> {
    match payload.action {
        PrAction::Opened | PrAction::Edited | PrAction::Closed => {}
        PrAction::Other => return None,
    }

    let mut event = Event {
        repo: payload.repo.clone(),
        base_ref: payload.base_ref.clone(),
        number: payload.number,
        state: payload.state.clone(),
        opened: payload.action == PrAction::Opened,
        closed: payload.action == PrAction::Closed,
        merged: payload.merged,
        body: payload.body.clone(),
        title: payload.title.clone(),
        html_url: payload.html_url.clone(),
        login: payload.author.clone(),
        ..Event::default()
    };
    event.set_reference(issue_key_from_title(&payload.title));

    // Backport markers are only honored on freshly opened pull requests;
    // later edits of a backport reconcile like any other PR.
    if event.opened
        && let Some(source) = backport_source(&payload.body)
    {
        event.cherrypick = true;
        event.cherrypick_from_pr = Some(source);
    }

    let previous_title = payload
        .changes
        .as_ref()
        .and_then(|c| c.title.as_ref())
        .map(|t| t.from.as_str())
        .filter(|t| !t.is_empty());

    match previous_title {
        Some(previous) => {
            let mut before = Event::default();
            before.set_reference(issue_key_from_title(previous));
            if before.key == event.key && before.missing == event.missing {
                debug!(number = payload.number.0, "title edit kept the same reference");
                return None;
            }
        }
        None => {
            if event.missing && !event.cherrypick && !validate_by_default.unwrap_or(false) {
                return None;
            }
        }
    }

    Some(event)
}

/// The outcome of digesting a comment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentDigest {
    /// Nothing to do: not a created comment, or no command present.
    Ignore,
    /// A command was issued on a plain issue; the caller owes the author an
    /// explanation instead of a reconciliation pass.
    NotAPullRequest,
    /// A command on a pull request, digested.
    Event(Event),
}

/// Digests an issue-comment payload, fetching the pull request's current
/// title and state from the source-control collaborator.
pub async fn digest_comment<S: ScmClient>(
    scm: &S,
    payload: &IssueCommentEvent,
) -> Result<CommentDigest, ScmError> {
    if payload.action != CommentAction::Created {
        return Ok(CommentDigest::Ignore);
    }
    let flags = parse_commands(&payload.body);
    if !flags.any() {
        return Ok(CommentDigest::Ignore);
    }
    if !payload.is_pull_request {
        return Ok(CommentDigest::NotAPullRequest);
    }

    let pr = scm
        .get_pull_request(&payload.repo, payload.number)
        .await?
        .ok_or(ScmError::PullRequestNotFound {
            number: payload.number,
        })?;

    let mut event = Event {
        repo: payload.repo.clone(),
        base_ref: pr.base_ref.clone(),
        number: payload.number,
        merged: pr.merged,
        refresh: flags.refresh,
        cc_qa: flags.cc_qa,
        body: payload.body.clone(),
        title: pr.title.clone(),
        html_url: payload.html_url.clone(),
        login: payload.author.clone(),
        ..Event::default()
    };
    event.set_reference(issue_key_from_title(&pr.title));

    if let Some(target) = flags.cherrypick {
        // The command names the issue to clone; the current title is beside
        // the point, so the reference is always treated as missing.
        event.key = Some(target);
        event.is_bug = false;
        event.missing = true;
        event.cherrypick = true;
        event.cherrypick_cmd = true;
    }

    Ok(CommentDigest::Event(event))
}
