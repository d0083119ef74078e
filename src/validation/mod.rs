//! The validity engine.
//!
//! Every configured predicate is evaluated against the bug and its
//! dependents; failures accumulate instead of short-circuiting so the user
//! sees every problem at once. An absent predicate is neither a pass nor a
//! fail. The pass and failure strings produced here are the user-facing
//! contract; the presentation layer renders them verbatim.

pub mod dependents;

use serde::{Deserialize, Serialize};

use crate::jira::{Issue, browse_url};
use crate::types::{BUG_PROJECT, BranchOptions, BugState, pretty_state, pretty_states};

pub use dependents::{Dependent, DependentError, DependentOrigin, resolve_dependents};

/// The outcome of one validation pass. Constructed fresh per call, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Set when a dependent lives outside the required project.
    pub invalid_dependent_project: bool,
    /// Satisfied-predicate descriptions, in evaluation order.
    pub validations: Vec<String>,
    /// Failure reasons, in evaluation order.
    pub reasons: Vec<String>,
}

/// Renders a dependent as a tracker link for user-facing messages.
fn dependent_display(dep: &Dependent, jira_base_url: &str, bugzilla_base_url: &str) -> String {
    match dep.origin {
        DependentOrigin::Jira => issue_display(&dep.key, jira_base_url),
        DependentOrigin::Bugzilla => format!(
            "[Bugzilla Bug {}]({}/show_bug.cgi?id={})",
            dep.key,
            bugzilla_base_url.trim_end_matches('/'),
            dep.key
        ),
    }
}

/// Renders an issue key as a tracker link for user-facing messages.
pub fn issue_display(key: &str, jira_base_url: &str) -> String {
    format!("[Jira Issue {}]({})", key, browse_url(jira_base_url, key))
}

/// Evaluates every configured predicate against a bug and its dependents.
pub fn validate_bug(
    issue: &Issue,
    dependents: &[Dependent],
    options: &BranchOptions,
    jira_base_url: &str,
    bugzilla_base_url: &str,
) -> ValidationResult {
    let mut validations: Vec<String> = Vec::new();
    let mut reasons: Vec<String> = Vec::new();
    let mut invalid_dependent_project = false;

    if let Some(expect_open) = options.is_open {
        match (expect_open, issue.is_open()) {
            (true, true) => {
                validations.push("bug is open, matching expected state (open)".to_string());
            }
            (false, false) => {
                validations
                    .push("bug isn't open, matching expected state (not open)".to_string());
            }
            (true, false) => {
                reasons.push("expected the bug to be open, but it isn't".to_string());
            }
            (false, true) => {
                reasons.push("expected the bug to not be open, but it is".to_string());
            }
        }
    }

    if let Some(want) = &options.target_version {
        match issue.target_version() {
            Some(actual) if actual == want => validations.push(format!(
                "bug target version ({actual}) matches configured target version \
                 for branch ({want})"
            )),
            Some(actual) => reasons.push(format!(
                "expected the bug to target the \"{want}\" version, but it targets \
                 \"{actual}\" instead"
            )),
            None => reasons.push(format!(
                "expected the bug to target the \"{want}\" version, but no target \
                 version was set"
            )),
        }
    }

    if let Some(states) = &options.valid_states {
        let mut allowed: Vec<BugState> = states.clone();
        if let Some(after) = &options.state_after_validation
            && !allowed.iter().any(|s| s.same_as(after))
        {
            allowed.push(after.clone());
        }
        let allowed_display = pretty_states(&allowed);
        let (status, resolution) = issue.state();
        let actual = pretty_state(status, resolution);
        if allowed.iter().any(|s| s.permits(status, resolution)) {
            validations.push(format!(
                "bug is in the state {actual}, which is one of the valid states \
                 ({allowed_display})"
            ));
        } else {
            reasons.push(format!(
                "expected the bug to be in one of the following states: \
                 {allowed_display}, but it is {actual} instead"
            ));
        }
    }

    if let Some(states) = &options.dependent_bug_states {
        let allowed_display = pretty_states(states);
        for dep in dependents {
            if !dep.in_project(BUG_PROJECT) {
                continue;
            }
            let display = dependent_display(dep, jira_base_url, bugzilla_base_url);
            let actual = pretty_state(dep.state.status.as_deref(), dep.state.resolution.as_deref());
            if states
                .iter()
                .any(|s| s.permits(dep.state.status.as_deref(), dep.state.resolution.as_deref()))
            {
                validations.push(format!(
                    "dependent bug {display} is in the state {actual}, which is one \
                     of the valid states ({allowed_display})"
                ));
            } else {
                reasons.push(format!(
                    "expected dependent {display} to be in one of the following \
                     states: {allowed_display}, but it is {actual} instead"
                ));
            }
        }
    }

    if let Some(versions) = &options.dependent_bug_target_versions {
        let versions_display = versions.join(", ");
        for dep in dependents {
            if !dep.in_project(BUG_PROJECT) {
                continue;
            }
            let display = dependent_display(dep, jira_base_url, bugzilla_base_url);
            match &dep.target_version {
                Some(actual) if versions.contains(actual) => validations.push(format!(
                    "dependent {display} targets the \"{actual}\" version, which is \
                     one of the valid target versions: {versions_display}"
                )),
                Some(actual) => reasons.push(format!(
                    "expected dependent {display} to target a version in \
                     {versions_display}, but it targets \"{actual}\" instead"
                )),
                None => reasons.push(format!(
                    "expected dependent {display} to target a version in \
                     {versions_display}, but no target version was set"
                )),
            }
        }
    }

    if options.expects_dependents() {
        if dependents.is_empty() {
            let display = issue_display(issue.key.as_str(), jira_base_url);
            let states = options
                .dependent_bug_states
                .as_deref()
                .map(pretty_states);
            let versions = options
                .dependent_bug_target_versions
                .as_ref()
                .map(|v| v.join(", "));
            let expectation = match (versions, states) {
                (Some(versions), Some(states)) => format!(
                    "targeting a version in {versions} and in one of the following \
                     states: {states}"
                ),
                (None, Some(states)) => {
                    format!("in one of the following states: {states}")
                }
                (Some(versions), None) => format!("targeting a version in {versions}"),
                (None, None) => unreachable!("expects_dependents checked above"),
            };
            reasons.push(format!(
                "expected {display} to depend on a bug {expectation}, but no \
                 dependents were found"
            ));
        } else {
            validations.push("bug has dependents".to_string());
        }
    }

    let offenders: Vec<&Dependent> = dependents
        .iter()
        .filter(|d| !d.in_project(BUG_PROJECT))
        .collect();
    if !offenders.is_empty() {
        invalid_dependent_project = true;
        // The project failure deliberately repeats the satisfied predicates:
        // the dedicated report for this case renders only the reasons list,
        // and it must still show the full picture.
        reasons.extend(validations.iter().cloned());
        for offender in offenders {
            reasons.push(format!(
                "dependent bug {} is not in the required `{}` project",
                offender.key, BUG_PROJECT
            ));
        }
    }

    ValidationResult {
        valid: reasons.is_empty(),
        invalid_dependent_project,
        validations,
        reasons,
    }
}
