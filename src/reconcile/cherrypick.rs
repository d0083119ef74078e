//! Backport (cherry-pick) cloning.
//!
//! A backport pull request tracks its own ticket: either an existing clone
//! of the original issue whose target version matches the backport branch,
//! or a freshly created one. When the original change was tracked in the
//! legacy tracker, the legacy bug is first translated into a native issue.
//! Duplicate-clone avoidance is idempotent: re-running for the same
//! (original, branch) pair reuses the first clone instead of creating
//! another.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::bugzilla::{Bug, BugzillaClient, bug_url};
use crate::events::Event;
use crate::jira::{IssueFields, IssueLink, JiraClient, LinkedIssue};
use crate::parser::{TitleReference, issue_key_from_title, legacy_bug_from_title};
use crate::scm::{ScmClient, pull_request_url};
use crate::types::{BUG_PROJECT, BranchOptions, BugzillaBugId, IssueKey};

use super::report::{CloneSource, Report, Section};
use super::{JiraContext, ReconcileError};

static CVE_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CVE-[0-9]{4}-[0-9]+$").expect("CVE pattern must compile"));

/// Runs the cloning flow for a backport event.
pub async fn handle_cherrypick<J, B, S>(
    jira: &J,
    bugzilla: &B,
    scm: &S,
    event: &Event,
    options: &BranchOptions,
) -> Result<Report, ReconcileError>
where
    J: JiraClient,
    B: BugzillaClient,
    S: ScmClient,
{
    if event.cherrypick_cmd {
        let key = event.key.clone().ok_or_else(|| {
            ReconcileError::Structural("cherrypick command carried no issue key".to_string())
        })?;
        return clone_jira_issue(jira, event, options, &key).await;
    }

    let source_number = event.cherrypick_from_pr.ok_or_else(|| {
        ReconcileError::Structural(
            "backport event carried no source pull request number".to_string(),
        )
    })?;
    let source_url = pull_request_url(&event.repo, source_number);
    let source_pr = scm
        .get_pull_request(&event.repo, source_number)
        .await
        .map_err(|err| ReconcileError::BackportSourceCheck {
            url: source_url.clone(),
            reason: err.to_string(),
        })?
        .ok_or_else(|| ReconcileError::BackportSourceCheck {
            url: source_url.clone(),
            reason: format!("pull request number {} does not exist", source_number.0),
        })?;

    match issue_key_from_title(&source_pr.title) {
        TitleReference::Key { key, .. } => clone_jira_issue(jira, event, options, &key).await,
        _ => match legacy_bug_from_title(&source_pr.title) {
            Some(id) => clone_legacy_bug(jira, bugzilla, event, options, id).await,
            // The source PR tracks nothing; there is nothing to clone.
            None => Ok(Report::new()),
        },
    }
}

/// Clones a native issue, or reuses an existing clone with the right target
/// version.
async fn clone_jira_issue<J: JiraClient>(
    jira: &J,
    event: &Event,
    options: &BranchOptions,
    key: &IssueKey,
) -> Result<Report, ReconcileError> {
    let target = required_target_version(options)?;
    let mut report = Report::new();

    let Some(original) = jira
        .get_issue(key.as_str())
        .await
        .map_err(|source| ReconcileError::Tracker {
            context: JiraContext::SearchingBug { key: key.clone() },
            source,
        })?
    else {
        report.sections.push(Section::IssueNotFound { key: key.clone() });
        return Ok(report);
    };

    // An existing clone targeting this branch's version wins over creating
    // a duplicate.
    for link in &original.fields.links {
        if !link.is_clone_type() {
            continue;
        }
        let Some(endpoint) = &link.inward_issue else {
            continue;
        };
        if endpoint.id == original.id || endpoint.key.as_ref() == Some(&original.key) {
            continue;
        }
        let candidate = jira
            .get_issue(endpoint.reference())
            .await
            .map_err(|source| ReconcileError::Tracker {
                context: JiraContext::SearchingBug {
                    key: IssueKey::new(endpoint.reference()),
                },
                source,
            })?;
        if let Some(candidate) = candidate
            && candidate.target_version() == Some(target)
        {
            info!(original = %key, clone = %candidate.key, "reusing existing clone");
            report.retitle = Some(retitle_command(
                &event.title,
                &format!("{key}:"),
                candidate.key.as_str(),
            ));
            report.sections.push(Section::CloneReused {
                source: key.clone(),
                clone: candidate.key.clone(),
            });
            return Ok(report);
        }
    }

    let mut fields = original.fields.clone();
    fields.description = Some(format!(
        "This is a clone of issue {}. The following is the description of \
         the original issue: \n---\n{}",
        original.key,
        original.fields.description.as_deref().unwrap_or_default()
    ));
    fields.status = None;
    fields.resolution = None;
    fields.links = vec![
        IssueLink::clones(LinkedIssue::by_id(original.id.clone())),
        IssueLink::blocked_by(LinkedIssue::by_id(original.id.clone())),
    ];

    let clone = jira
        .create_issue(fields)
        .await
        .map_err(|source| ReconcileError::Tracker {
            context: JiraContext::CreatingClone { key: key.clone() },
            source,
        })?;
    info!(original = %key, clone = %clone.key, "created backport clone");

    // The target version rides in a follow-up update; a failure here is a
    // warning on an otherwise successful clone, not an overall failure.
    let mut updated = clone.clone();
    updated.fields.target_versions = vec![target.to_string()];
    if let Err(err) = jira.update_issue(&updated).await {
        warn!(clone = %clone.key, error = %err, "failed to set clone target version");
        report.warnings.push(format!(
            "Failed to update the target version for the clone. Please update \
             the target version manually: {err}"
        ));
    }

    report.retitle = Some(retitle_command(
        &event.title,
        &format!("{key}:"),
        clone.key.as_str(),
    ));
    report.sections.push(Section::CloneCreated {
        source: CloneSource::Jira(key.clone()),
        clone: clone.key.clone(),
    });
    Ok(report)
}

/// Translates a legacy bug into a native issue and records the bridge.
async fn clone_legacy_bug<J, B>(
    jira: &J,
    bugzilla: &B,
    event: &Event,
    options: &BranchOptions,
    id: BugzillaBugId,
) -> Result<Report, ReconcileError>
where
    J: JiraClient,
    B: BugzillaClient,
{
    let target = required_target_version(options)?;
    let mut report = Report::new();

    let Some(bug) = bugzilla
        .get_bug(id)
        .await
        .map_err(|source| ReconcileError::Bridge { id, source })?
    else {
        report.sections.push(Section::LegacyBugNotFound { id });
        return Ok(report);
    };
    let comments = bugzilla
        .list_comments(id)
        .await
        .map_err(|source| ReconcileError::Bridge { id, source })?;
    let sub_components = bugzilla
        .list_sub_components(id)
        .await
        .map_err(|source| ReconcileError::Bridge { id, source })?;

    let url = bug_url(bugzilla.base_url(), id);
    let description = comments
        .first()
        .map(|c| c.text.clone())
        .unwrap_or_default();
    let components = bug
        .component
        .iter()
        .map(|component| match sub_components
            .get(component)
            .and_then(|subs| subs.first())
        {
            Some(sub) => format!("{component} / {sub}"),
            None => component.clone(),
        })
        .collect();

    let fields = IssueFields {
        summary: bug.summary.clone(),
        description: Some(format!(
            "This bug is a backport clone of [Bugzilla Bug {id}]({url}). The \
             following is the description of the original bug:\n---\n{description}"
        )),
        project: Some(BUG_PROJECT.to_string()),
        issue_type: Some("Bug".to_string()),
        affects_versions: vec![target.to_string()],
        target_versions: vec![target.to_string()],
        components,
        labels: legacy_security_labels(bugzilla, &bug).await?,
        blocked_by_bugzilla_bug: Some(url),
        ..IssueFields::default()
    };

    let clone = jira
        .create_issue(fields)
        .await
        .map_err(|source| ReconcileError::Tracker {
            context: JiraContext::CreatingClone {
                key: IssueKey::new(format!("Bug {id}")),
            },
            source,
        })?;
    info!(legacy = %id, clone = %clone.key, "translated legacy bug into backport clone");

    report.retitle = Some(retitle_command(
        &event.title,
        &format!("Bug {id}:"),
        clone.key.as_str(),
    ));
    report.sections.push(Section::CloneCreated {
        source: CloneSource::Bugzilla(id),
        clone: clone.key.clone(),
    });
    Ok(report)
}

/// The security-tracking labels a bridged legacy bug contributes: its
/// keywords, its whiteboard, and, for each blocked bug whose alias is a CVE
/// identifier, the CVE and a flaw reference.
pub(super) async fn legacy_security_labels<B: BugzillaClient>(
    bugzilla: &B,
    bug: &Bug,
) -> Result<Vec<String>, ReconcileError> {
    let mut labels: Vec<String> = bug.keywords.clone();
    if let Some(whiteboard) = &bug.whiteboard
        && !whiteboard.is_empty()
    {
        labels.push(whiteboard.clone());
    }
    for &blocked in &bug.blocks {
        let blocked_id = BugzillaBugId(blocked);
        let Some(flaw) = bugzilla
            .get_bug(blocked_id)
            .await
            .map_err(|source| ReconcileError::Bridge {
                id: blocked_id,
                source,
            })?
        else {
            continue;
        };
        let mut is_flaw = false;
        for alias in &flaw.alias {
            if CVE_ALIAS.is_match(alias) {
                labels.push(alias.clone());
                is_flaw = true;
            }
        }
        if is_flaw {
            labels.push(format!("flaw:bz#{blocked}"));
        }
    }
    Ok(labels)
}

/// Builds the `/retitle` command that points the pull request at its clone:
/// the original reference (with its trailing colon) is replaced in place, or
/// the new key is prefixed when the title carried no reference.
fn retitle_command(title: &str, old_reference: &str, new_key: &str) -> String {
    let new_title = if title.contains(old_reference) {
        title.replacen(old_reference, &format!("{new_key}:"), 1)
    } else {
        format!("{new_key}: {title}")
    };
    format!("/retitle {new_title}")
}

fn required_target_version(options: &BranchOptions) -> Result<&str, ReconcileError> {
    options
        .target_version
        .as_deref()
        .ok_or_else(|| {
            ReconcileError::Structural(
                "cannot clone for a backport: no target version is configured for \
                 this branch"
                    .to_string(),
            )
        })
}
