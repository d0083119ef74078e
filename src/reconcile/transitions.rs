//! The state transition executor.
//!
//! Moves an issue to a desired (status, resolution) pair. The comparison is
//! case-insensitive and the whole operation is a no-op when the issue is
//! already there, so repeated deliveries of the same event never
//! double-transition.

use thiserror::Error;
use tracing::{debug, info};

use crate::jira::{Issue, JiraClient, JiraError};
use crate::types::BugState;

/// A failure moving an issue to a target state.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The workflow offers no transition landing in the target status. The
    /// issue is left untouched; the caller reports and moves on.
    #[error("no transition to the {status} status exists for {key}")]
    NoMatchingTransition { key: String, status: String },

    #[error(transparent)]
    Jira(#[from] JiraError),
}

/// Moves an issue to the target state unless it is already there.
///
/// Returns `Ok(true)` when a transition ran, `Ok(false)` for the no-op case.
pub async fn move_to_state<J: JiraClient>(
    jira: &J,
    issue: &Issue,
    target: &BugState,
) -> Result<bool, TransitionError> {
    let (status, resolution) = issue.state();
    if target.permits(status, resolution) {
        debug!(key = %issue.key, state = %target, "issue already in target state");
        return Ok(false);
    }

    if let Some(target_status) = &target.status {
        let already_there = status.is_some_and(|s| s.eq_ignore_ascii_case(target_status));
        if !already_there {
            let transitions = jira.list_transitions(issue.key.as_str()).await?;
            let transition = transitions
                .iter()
                .find(|t| t.target_status.eq_ignore_ascii_case(target_status))
                .ok_or_else(|| TransitionError::NoMatchingTransition {
                    key: issue.key.to_string(),
                    status: target_status.clone(),
                })?;
            jira.apply_transition(issue.key.as_str(), &transition.id)
                .await?;
            info!(key = %issue.key, status = %target_status, "transitioned issue");
        }
    }

    if let Some(target_resolution) = &target.resolution {
        let already_set =
            resolution.is_some_and(|r| r.eq_ignore_ascii_case(target_resolution));
        if !already_set {
            // Re-read before mutating: the transition above may have reset
            // fields, and the tracker is the source of truth.
            let mut fresh = jira
                .get_issue(issue.key.as_str())
                .await?
                .unwrap_or_else(|| issue.clone());
            fresh.fields.resolution = Some(target_resolution.clone());
            jira.update_issue(&fresh).await?;
            info!(key = %issue.key, resolution = %target_resolution, "set resolution");
        }
    }

    Ok(true)
}
