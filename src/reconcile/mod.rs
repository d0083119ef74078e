//! The reconciliation engine.
//!
//! One webhook delivery triggers exactly one synchronous pass through
//! [`Reconciler::handle`]: route backports to the cloner, fetch and gate the
//! referenced issue, validate it against the branch policy, and drive labels,
//! links, and issue state toward consistency. Every mutation follows a
//! read-compare-mutate discipline so redundant deliveries converge. The
//! engine performs no retries; a failed remote call surfaces once as a
//! [`ReconcileError`] for the caller to report.

pub mod cherrypick;
pub mod labels;
pub mod links;
pub mod report;
pub mod transitions;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::bugzilla::{BugzillaClient, BugzillaError};
use crate::events::Event;
use crate::jira::{Issue, IssueComment, JiraClient, JiraError};
use crate::scm::{ScmClient, ScmError};
use crate::types::{BranchOptions, BugzillaBugId, IssueKey, pretty_state};
use crate::validation::{DependentError, dependents::bridged_bug_id, resolve_dependents, validate_bug};

use labels::{DesiredLabels, apply_labels, severity_label};
use links::{desired_link, ensure_link, merge_completion, referenced_prs, remove_links_for_pr};
use report::{Report, Section};
use transitions::{TransitionError, move_to_state};

pub use report::{CloneSource, LabelDiff, LinkDiff, LinkedPr, UnmergedPr};

/// What the engine was doing when a tracker call failed. Rendered into the
/// user-facing failure comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JiraContext {
    SearchingBug { key: IssueKey },
    SearchingDependent { dependent: String, parent: IssueKey },
    CreatingClone { key: IssueKey },
    ReconcilingLinks { key: IssueKey },
    Transitioning { key: IssueKey },
}

impl fmt::Display for JiraContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JiraContext::SearchingBug { key } => write!(f, "searching for bug {key}"),
            JiraContext::SearchingDependent { dependent, parent } => {
                write!(f, "searching for dependent bug {dependent} for bug {parent}")
            }
            JiraContext::CreatingClone { key } => {
                write!(f, "creating a cherry-pick bug for {key}")
            }
            JiraContext::ReconcilingLinks { key } => {
                write!(f, "reconciling external links on bug {key}")
            }
            JiraContext::Transitioning { key } => write!(f, "transitioning bug {key}"),
        }
    }
}

/// A failure that ends the pass. The caller renders it into a single
/// user-facing comment with an instruction to retry via refresh.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("error {context} on the Jira server: {source}")]
    Tracker {
        context: JiraContext,
        #[source]
        source: JiraError,
    },

    #[error("dependent bug {dependent} of {parent} does not exist")]
    DependentMissing { dependent: String, parent: IssueKey },

    #[error("error reaching the legacy tracker for bug {id}: {source}")]
    Bridge {
        id: BugzillaBugId,
        #[source]
        source: BugzillaError,
    },

    #[error("failed to check the state of cherrypicked pull request at {url}: {reason}")]
    BackportSourceCheck { url: String, reason: String },

    #[error("source control call failed: {source}")]
    Scm {
        #[from]
        source: ScmError,
    },

    #[error("{0}")]
    Structural(String),
}

impl ReconcileError {
    fn from_dependent(err: DependentError) -> Self {
        match err {
            DependentError::Fetch {
                dependent,
                parent,
                source,
            } => ReconcileError::Tracker {
                context: JiraContext::SearchingDependent { dependent, parent },
                source,
            },
            DependentError::Missing { dependent, parent } => {
                ReconcileError::DependentMissing { dependent, parent }
            }
            DependentError::BridgeFetch { id, source, .. } => {
                ReconcileError::Bridge { id, source }
            }
            DependentError::BridgeMissing { id, parent } => ReconcileError::Structural(format!(
                "legacy bug {id} bridged from {parent} does not exist"
            )),
            DependentError::MalformedBridge { parent, url } => ReconcileError::Structural(
                format!("{parent} bridges a legacy bug with an unparseable URL: {url}"),
            ),
        }
    }
}

/// Whether automation may touch this issue at all, given the repository's
/// allowed security levels. An empty allow-list means unrestricted; an issue
/// without a level sits at the `default` level.
pub fn is_bug_allowed(issue: &Issue, allowed_security_levels: &[String]) -> bool {
    if allowed_security_levels.is_empty() {
        return true;
    }
    let level = issue
        .fields
        .security_level
        .as_ref()
        .map(|l| l.name.as_str())
        .unwrap_or("default");
    allowed_security_levels.iter().any(|l| l == level)
}

/// The engine. Holds the three collaborators and the set of repositories
/// whose pull request links participate in merge-completion.
pub struct Reconciler<J, B, S> {
    jira: J,
    bugzilla: B,
    scm: S,
    recognized_repos: HashSet<crate::types::RepoId>,
}

impl<J, B, S> Reconciler<J, B, S>
where
    J: JiraClient + Sync,
    B: BugzillaClient + Sync,
    S: ScmClient + Sync,
{
    pub fn new(
        jira: J,
        bugzilla: B,
        scm: S,
        recognized_repos: HashSet<crate::types::RepoId>,
    ) -> Self {
        Reconciler {
            jira,
            bugzilla,
            scm,
            recognized_repos,
        }
    }

    /// Runs one reconciliation pass for a digested event.
    pub async fn handle(
        &self,
        event: &Event,
        options: &BranchOptions,
    ) -> Result<Report, ReconcileError> {
        if event.cherrypick {
            return cherrypick::handle_cherrypick(
                &self.jira,
                &self.bugzilla,
                &self.scm,
                event,
                options,
            )
            .await;
        }

        let mut report = Report::new();
        let Some(key) = event.key.clone() else {
            // Nothing referenced: only an explicit refresh earns a reply.
            if event.refresh {
                report.sections.push(Section::NoIssueReferenced);
            }
            return Ok(report);
        };

        if !event.is_bug {
            // A non-defect reference (including the explicit no-issue
            // sentinel) gets the reference label and nothing else.
            debug!(key = %key, "non-defect reference, labels only");
            report.labels = apply_labels(
                &self.scm,
                &event.repo,
                event.number,
                &DesiredLabels::reference_only(),
            )
            .await?;
            return Ok(report);
        }

        let Some(issue) = self
            .jira
            .get_issue(key.as_str())
            .await
            .map_err(|source| ReconcileError::Tracker {
                context: JiraContext::SearchingBug { key: key.clone() },
                source,
            })?
        else {
            report.sections.push(Section::IssueNotFound { key });
            return Ok(report);
        };

        if !is_bug_allowed(&issue, &options.allowed_security_levels) {
            // Restricted issues are invisible to the automation: no labels,
            // no transitions. Only an explicit request earns an explanation.
            if event.opened || event.refresh {
                report.sections.push(Section::SecurityLevelDisallowed {
                    key,
                    allowed: options.allowed_security_levels.clone(),
                });
            }
            return Ok(report);
        }

        if event.merged {
            return self.handle_merge(&key, &issue, options, report).await;
        }
        if event.closed {
            return self.handle_close(event, &key, &issue, options, report).await;
        }
        self.handle_validation(event, &key, &issue, options, report)
            .await
    }

    /// The open/edit/refresh path: validate and reconcile labels, state, and
    /// the external link.
    async fn handle_validation(
        &self,
        event: &Event,
        key: &IssueKey,
        issue: &Issue,
        options: &BranchOptions,
        mut report: Report,
    ) -> Result<Report, ReconcileError> {
        let dependents = resolve_dependents(&self.jira, &self.bugzilla, issue)
            .await
            .map_err(ReconcileError::from_dependent)?;
        let result = validate_bug(
            issue,
            &dependents,
            options,
            self.jira.base_url(),
            self.bugzilla.base_url(),
        );
        let severity = issue.fields.severity.as_ref().and_then(severity_label);

        if result.valid {
            info!(key = %key, validations = result.validations.len(), "bug is valid");
            report.labels = apply_labels(
                &self.scm,
                &event.repo,
                event.number,
                &DesiredLabels::valid(severity),
            )
            .await?;

            let moved_to = match options.state_after_validation.as_ref() {
                Some(target) => self
                    .transition(key, issue, target, &mut report)
                    .await?,
                None => None,
            };

            let mut external_link_added = false;
            if options.add_external_link == Some(true) {
                external_link_added = ensure_link(&self.jira, key.as_str(), &desired_link(event))
                    .await
                    .map_err(|source| ReconcileError::Tracker {
                        context: JiraContext::ReconcilingLinks { key: key.clone() },
                        source,
                    })?;
                if external_link_added {
                    report.links.added.push(event.html_url.clone());
                }
            }

            if event.refresh {
                self.sync_legacy_labels(issue).await?;
            }

            report.sections.push(Section::Valid {
                key: key.clone(),
                validations: result.validations,
                moved_to,
                external_link_added,
            });

            if event.cc_qa {
                self.request_qa_review(key, issue, &mut report).await?;
            }
        } else {
            info!(key = %key, reasons = result.reasons.len(), "bug is invalid");
            let current = self.scm.list_labels(&event.repo, event.number).await?;
            let retained_human_label = current.iter().any(|l| l == labels::VALID_BUG)
                && self
                    .scm
                    .label_applied_by_human(&event.repo, event.number, labels::VALID_BUG)
                    .await?;
            report.labels = apply_labels(
                &self.scm,
                &event.repo,
                event.number,
                &DesiredLabels::invalid(severity, retained_human_label),
            )
            .await?;
            report.sections.push(Section::Invalid {
                key: key.clone(),
                reasons: result.reasons,
                retained_human_label,
                dependent_project_violation: result.invalid_dependent_project,
            });
        }

        Ok(report)
    }

    /// The merged path: fire the post-merge transition only when every
    /// linked pull request in a recognized repository has merged.
    async fn handle_merge(
        &self,
        key: &IssueKey,
        issue: &Issue,
        options: &BranchOptions,
        mut report: Report,
    ) -> Result<Report, ReconcileError> {
        let Some(target) = options.state_after_merge.as_ref() else {
            return Ok(report);
        };

        let remote_links = self
            .jira
            .list_remote_links(key.as_str())
            .await
            .map_err(|source| ReconcileError::Tracker {
                context: JiraContext::ReconcilingLinks { key: key.clone() },
                source,
            })?;
        let refs = referenced_prs(&remote_links, &self.recognized_repos);
        let completion = merge_completion(&self.scm, &refs).await?;

        if completion.merged.is_empty() {
            // Nothing recognized has merged; there is nothing to report.
            return Ok(report);
        }

        if completion.unmerged.is_empty() {
            // A bug parked in a state the branch does not recognize is not
            // silently dragged forward, even once everything has merged.
            let allowed = options.premerge_states();
            let (status, resolution) = issue.state();
            if !allowed.is_empty() && !allowed.iter().any(|s| s.permits(status, resolution)) {
                report.sections.push(Section::PremergeUnrecognizedState {
                    key: key.clone(),
                    current: pretty_state(status, resolution),
                    withheld: target.clone(),
                });
                return Ok(report);
            }
            let moved_to = self.transition(key, issue, target, &mut report).await?;
            report.sections.push(Section::MergeCompleted {
                key: key.clone(),
                merged: completion.merged,
                moved_to,
            });
        } else {
            debug!(key = %key, outstanding = completion.unmerged.len(), "merge incomplete");
            report.sections.push(Section::MergeIncomplete {
                key: key.clone(),
                merged: completion.merged,
                unmerged: completion.unmerged,
                withheld: target.clone(),
            });
        }

        Ok(report)
    }

    /// The closed-without-merge path: drop the pull request's external link
    /// and, when it was the last one, reset the bug.
    async fn handle_close(
        &self,
        event: &Event,
        key: &IssueKey,
        issue: &Issue,
        options: &BranchOptions,
        mut report: Report,
    ) -> Result<Report, ReconcileError> {
        if options.add_external_link != Some(true) {
            return Ok(report);
        }

        let removal = remove_links_for_pr(&self.jira, key.as_str(), &event.repo, event.number)
            .await
            .map_err(|source| ReconcileError::Tracker {
                context: JiraContext::ReconcilingLinks { key: key.clone() },
                source,
            })?;
        if removal.removed.is_empty() {
            return Ok(report);
        }
        report.links.removed = removal.removed;

        let all_links_closed = removal.remaining_pr_links == 0;
        let mut state_reset = None;
        if all_links_closed
            && let Some(target) = options.state_after_close.as_ref()
            && let Some(moved) = self.transition(key, issue, target, &mut report).await?
        {
            let note = format!(
                "Bug status changed to {} as previous linked PR {} has been closed",
                moved.status.as_deref().unwrap_or_default(),
                event.html_url
            );
            self.jira
                .add_comment(key.as_str(), &IssueComment::private(note))
                .await
                .map_err(|source| ReconcileError::Tracker {
                    context: JiraContext::Transitioning { key: key.clone() },
                    source,
                })?;
            state_reset = Some(moved);
        }

        report.sections.push(Section::LinkRemoved {
            key: key.clone(),
            all_links_closed,
            state_reset,
        });
        Ok(report)
    }

    /// Applies a transition, downgrading an unreachable target status to a
    /// warning: the pass continues, the issue is left untouched.
    async fn transition(
        &self,
        key: &IssueKey,
        issue: &Issue,
        target: &crate::types::BugState,
        report: &mut Report,
    ) -> Result<Option<crate::types::BugState>, ReconcileError> {
        match move_to_state(&self.jira, issue, target).await {
            Ok(true) => Ok(Some(target.clone())),
            Ok(false) => Ok(None),
            Err(TransitionError::NoMatchingTransition { key, status }) => {
                report.warnings.push(format!(
                    "no transition to the {status} status exists for {key}; the bug \
                     was left in place"
                ));
                Ok(None)
            }
            Err(TransitionError::Jira(source)) => Err(ReconcileError::Tracker {
                context: JiraContext::Transitioning { key: key.clone() },
                source,
            }),
        }
    }

    /// Resolves the QA contact to a source-control login and records the
    /// review request, or why none could be made.
    async fn request_qa_review(
        &self,
        key: &IssueKey,
        issue: &Issue,
        report: &mut Report,
    ) -> Result<(), ReconcileError> {
        let email = issue
            .fields
            .qa_contact
            .as_ref()
            .and_then(|c| c.email.as_deref());
        let Some(email) = email else {
            report
                .sections
                .push(Section::QaContactMissing { key: key.clone() });
            return Ok(());
        };
        let mut logins = self.scm.search_users_by_email(email).await?;
        match logins.len() {
            0 => report.sections.push(Section::QaContactNotFound {
                email: email.to_string(),
            }),
            1 => report.sections.push(Section::QaReviewRequested {
                login: logins.remove(0),
            }),
            _ => report.sections.push(Section::QaContactAmbiguous {
                email: email.to_string(),
                logins,
            }),
        }
        Ok(())
    }

    /// Pulls security-tracking labels from a bridged legacy bug onto the
    /// issue, union-ed with the existing labels and sorted. No update is
    /// issued when the set is already right.
    async fn sync_legacy_labels(&self, issue: &Issue) -> Result<(), ReconcileError> {
        let Some(url) = &issue.fields.blocked_by_bugzilla_bug else {
            return Ok(());
        };
        let Some(id) = bridged_bug_id(url) else {
            return Err(ReconcileError::Structural(format!(
                "{} bridges a legacy bug with an unparseable URL: {url}",
                issue.key
            )));
        };
        let Some(bug) = self
            .bugzilla
            .get_bug(id)
            .await
            .map_err(|source| ReconcileError::Bridge { id, source })?
        else {
            return Ok(());
        };

        let desired = cherrypick::legacy_security_labels(&self.bugzilla, &bug).await?;
        let labels: Vec<String> = issue
            .fields
            .labels
            .iter()
            .cloned()
            .chain(desired)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if labels != issue.fields.labels {
            let mut updated = issue.clone();
            updated.fields.labels = labels;
            self.jira
                .update_issue(&updated)
                .await
                .map_err(|source| ReconcileError::Tracker {
                    context: JiraContext::SearchingBug {
                        key: issue.key.clone(),
                    },
                    source,
                })?;
            info!(key = %issue.key, "synced security labels from the legacy tracker");
        }
        Ok(())
    }
}
