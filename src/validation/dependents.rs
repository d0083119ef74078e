//! Dependency resolution.
//!
//! Walks an issue's clone/blocks links (and its legacy-tracker bridge field)
//! and normalizes every dependent into the same shape, so the validity
//! engine never special-cases the tracker a dependent lives in. Dependent
//! lists are rebuilt on every pass; tracker state may have changed since the
//! last one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::bugzilla::{BugzillaClient, BugzillaError};
use crate::jira::{Issue, JiraClient, JiraError};
use crate::types::{BugState, BugzillaBugId, IssueKey};

static BRIDGE_BUG_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id=([0-9]+)").expect("bridge bug ID pattern must compile"));

/// Which tracker a dependent lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependentOrigin {
    Jira,
    Bugzilla,
}

/// A normalized view of a linked issue relevant to validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    /// Issue key for native dependents, numeric ID for legacy ones.
    pub key: String,
    pub state: BugState,
    pub target_version: Option<String>,
    pub origin: DependentOrigin,
}

impl Dependent {
    /// Whether this dependent belongs to the given project. Legacy
    /// dependents have no project and are exempt from project checks.
    pub fn in_project(&self, project: &str) -> bool {
        match self.origin {
            DependentOrigin::Jira => self.key.starts_with(&format!("{project}-")),
            DependentOrigin::Bugzilla => true,
        }
    }
}

/// A failure resolving an issue's dependents.
#[derive(Debug, Error)]
pub enum DependentError {
    #[error("failed to fetch dependent bug {dependent} of {parent}: {source}")]
    Fetch {
        dependent: String,
        parent: IssueKey,
        #[source]
        source: JiraError,
    },

    #[error("dependent bug {dependent} of {parent} does not exist")]
    Missing { dependent: String, parent: IssueKey },

    #[error("failed to fetch legacy bug {id} bridged from {parent}: {source}")]
    BridgeFetch {
        id: BugzillaBugId,
        parent: IssueKey,
        #[source]
        source: BugzillaError,
    },

    #[error("legacy bug {id} bridged from {parent} does not exist")]
    BridgeMissing { id: BugzillaBugId, parent: IssueKey },

    #[error("{parent} bridges a legacy bug with an unparseable URL: {url}")]
    MalformedBridge { parent: IssueKey, url: String },
}

/// Parses the numeric bug ID out of a legacy-tracker bridge URL.
pub fn bridged_bug_id(url: &str) -> Option<BugzillaBugId> {
    let captures = BRIDGE_BUG_ID.captures(url)?;
    captures[1].parse::<u64>().ok().map(BugzillaBugId)
}

/// Resolves the dependents of an issue: the targets of its clone/blocks
/// links plus the bridged legacy bug, when one is recorded.
pub async fn resolve_dependents<J, B>(
    jira: &J,
    bugzilla: &B,
    issue: &Issue,
) -> Result<Vec<Dependent>, DependentError>
where
    J: JiraClient,
    B: BugzillaClient,
{
    let mut references: Vec<&str> = Vec::new();
    for link in &issue.fields.links {
        // The dependent side of a clone link is the issue this one clones;
        // for a blocks link it is the issue this one is blocked by.
        let endpoint = if link.is_clone_type() {
            link.outward_issue.as_ref()
        } else if link.is_blocks_type() {
            link.inward_issue.as_ref()
        } else {
            None
        };
        let Some(endpoint) = endpoint else { continue };
        if endpoint.id == issue.id || endpoint.key.as_ref() == Some(&issue.key) {
            continue;
        }
        let reference = endpoint.reference();
        if !references.contains(&reference) {
            references.push(reference);
        }
    }

    let mut dependents: Vec<Dependent> = Vec::new();
    for reference in references {
        let fetched = jira
            .get_issue(reference)
            .await
            .map_err(|source| DependentError::Fetch {
                dependent: reference.to_string(),
                parent: issue.key.clone(),
                source,
            })?
            .ok_or_else(|| DependentError::Missing {
                dependent: reference.to_string(),
                parent: issue.key.clone(),
            })?;
        if dependents.iter().any(|d| d.key == fetched.key.as_str()) {
            continue;
        }
        debug!(parent = %issue.key, dependent = %fetched.key, "resolved dependent");
        dependents.push(Dependent {
            key: fetched.key.to_string(),
            state: BugState {
                status: fetched.fields.status.clone(),
                resolution: fetched.fields.resolution.clone(),
            },
            target_version: fetched.target_version().map(str::to_string),
            origin: DependentOrigin::Jira,
        });
    }

    if let Some(url) = &issue.fields.blocked_by_bugzilla_bug {
        let id = bridged_bug_id(url).ok_or_else(|| DependentError::MalformedBridge {
            parent: issue.key.clone(),
            url: url.clone(),
        })?;
        let bug = bugzilla
            .get_bug(id)
            .await
            .map_err(|source| DependentError::BridgeFetch {
                id,
                parent: issue.key.clone(),
                source,
            })?
            .ok_or(DependentError::BridgeMissing {
                id,
                parent: issue.key.clone(),
            })?;
        debug!(parent = %issue.key, legacy = %id, "resolved bridged legacy dependent");
        dependents.push(Dependent {
            key: id.to_string(),
            state: BugState {
                status: bug.status.clone(),
                resolution: bug.resolution.clone(),
            },
            target_version: bug.target_release.first().cloned(),
            origin: DependentOrigin::Bugzilla,
        });
    }

    Ok(dependents)
}
