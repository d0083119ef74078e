//! Reconciles the lifecycle of pull requests with the lifecycle of Jira
//! issues, including issues bridged from the legacy Bugzilla tracker.
//!
//! Given a digested webhook event, the engine determines which issue the
//! pull request refers to, evaluates the branch's policy predicates over the
//! issue and its dependency graph, and drives labels, external links, and
//! issue state toward consistency, idempotently, so redundant deliveries of
//! the same event converge. Backport pull requests get "cherry-pick"
//! treatment: the original issue is cloned (or an existing clone reused) so
//! the backport tracks its own ticket.
//!
//! The webhook transport, config resolution, and markdown rendering live
//! outside this crate; the engine consumes resolved [`types::BranchOptions`]
//! and produces a structured [`reconcile::report::Report`].

pub mod bugzilla;
pub mod events;
pub mod jira;
pub mod parser;
pub mod reconcile;
pub mod scm;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;
