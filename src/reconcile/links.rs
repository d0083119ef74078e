//! External link reconciliation and merge-completion.
//!
//! Tracker-side remote links tie an issue to the pull requests that fix it.
//! Links are diffed by URL: adding is skipped when the URL already exists,
//! and closing a pull request removes exactly the links that reference it.
//! Merge-completion partitions every linked pull request in a recognized
//! repository into merged and unmerged sets.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::events::Event;
use crate::jira::{JiraClient, JiraError, RemoteLink, RemoteLinkIcon};
use crate::scm::{ScmClient, ScmError, pull_request_url};
use crate::types::{PrNumber, RepoId};

use super::report::{LinkedPr, UnmergedPr};

static PR_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/([^/]+)/([^/]+)/pull/([0-9]+)")
        .expect("pull request link pattern must compile")
});

/// Parses the pull request a link URL points at, if any. Issue links and
/// other tracker URLs return `None`.
pub fn parse_pr_link(url: &str) -> Option<(RepoId, PrNumber)> {
    let captures = PR_LINK.captures(url)?;
    let number = captures[3].parse::<u64>().ok()?;
    Some((
        RepoId::new(&captures[1], &captures[2]),
        PrNumber(number),
    ))
}

/// The link the event's pull request should have on its issue.
pub fn desired_link(event: &Event) -> RemoteLink {
    RemoteLink {
        id: None,
        url: event.html_url.clone(),
        title: format!("{}#{}: {}", event.repo, event.number.0, event.title),
        icon: Some(RemoteLinkIcon::github()),
    }
}

/// Ensures the issue carries the given link. Returns whether a link was
/// actually created; an existing link with the same URL means no mutation.
pub async fn ensure_link<J: JiraClient>(
    jira: &J,
    key: &str,
    link: &RemoteLink,
) -> Result<bool, JiraError> {
    let existing = jira.list_remote_links(key).await?;
    if existing.iter().any(|l| l.url == link.url) {
        debug!(key, url = %link.url, "external link already present");
        return Ok(false);
    }
    jira.add_remote_link(key, link).await?;
    info!(key, url = %link.url, "added external link");
    Ok(true)
}

/// The outcome of removing a closing pull request's links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRemoval {
    /// URLs of the links that were removed.
    pub removed: Vec<String>,
    /// How many links referencing a pull request remain on the issue.
    pub remaining_pr_links: usize,
}

/// Removes exactly the links that reference the closing pull request.
/// Unrelated links for other pull requests on the same issue are untouched.
pub async fn remove_links_for_pr<J: JiraClient>(
    jira: &J,
    key: &str,
    repo: &RepoId,
    number: PrNumber,
) -> Result<LinkRemoval, JiraError> {
    let existing = jira.list_remote_links(key).await?;
    let mut removal = LinkRemoval::default();
    for link in &existing {
        match parse_pr_link(&link.url) {
            Some((link_repo, link_number)) if link_repo == *repo && link_number == number => {
                if let Some(id) = link.id {
                    jira.remove_remote_link(key, id).await?;
                    info!(key, url = %link.url, "removed external link");
                    removal.removed.push(link.url.clone());
                }
            }
            Some(_) => removal.remaining_pr_links += 1,
            None => {}
        }
    }
    Ok(removal)
}

/// The partition of linked pull requests by merge state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeCompletion {
    pub merged: Vec<LinkedPr>,
    pub unmerged: Vec<UnmergedPr>,
}

impl MergeCompletion {
    /// The post-merge transition fires only when at least one linked pull
    /// request merged and none are outstanding.
    pub fn complete(&self) -> bool {
        !self.merged.is_empty() && self.unmerged.is_empty()
    }
}

/// Collects the distinct pull requests referenced by an issue's links,
/// restricted to recognized repositories. Links into unrecognized
/// repositories are ignored entirely: they neither merge nor block.
pub fn referenced_prs(
    links: &[RemoteLink],
    recognized: &HashSet<RepoId>,
) -> Vec<(RepoId, PrNumber)> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for link in links {
        let Some((repo, number)) = parse_pr_link(&link.url) else {
            continue;
        };
        if !recognized.contains(&repo) {
            debug!(url = %link.url, "ignoring link into unrecognized repository");
            continue;
        }
        if seen.insert((repo.clone(), number)) {
            refs.push((repo, number));
        }
    }
    refs
}

/// Queries each referenced pull request once and partitions them.
pub async fn merge_completion<S: ScmClient>(
    scm: &S,
    refs: &[(RepoId, PrNumber)],
) -> Result<MergeCompletion, ScmError> {
    let mut completion = MergeCompletion::default();
    for (repo, number) in refs {
        let pr = scm
            .get_pull_request(repo, *number)
            .await?
            .ok_or(ScmError::PullRequestNotFound { number: *number })?;
        let linked = LinkedPr {
            repo: repo.clone(),
            number: *number,
            url: pull_request_url(repo, *number),
        };
        if pr.merged {
            completion.merged.push(linked);
        } else {
            completion.unmerged.push(UnmergedPr {
                pr: linked,
                state: pr.state.clone(),
            });
        }
    }
    Ok(completion)
}
