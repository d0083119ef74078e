//! Legacy-tracker (Bugzilla) data model and collaborator trait.
//!
//! Bugzilla bugs only reach the engine through the bridge: either as the
//! dependent of a Jira issue that carries the bridge field, or as the source
//! of a backport clone. In both cases the bug is normalized into the same
//! shapes the engine uses for native issues, so nothing downstream
//! special-cases the tracker of origin.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::BugzillaBugId;

/// A bug in the legacy tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    pub id: u64,
    pub summary: String,
    pub status: Option<String>,
    pub resolution: Option<String>,
    /// Multi-value target release; the first entry wins, as with Jira
    /// target versions.
    pub target_release: Vec<String>,
    pub component: Vec<String>,
    pub keywords: Vec<String>,
    pub whiteboard: Option<String>,
    /// IDs of bugs this bug blocks. For security-tracking bugs these point
    /// at CVE flaw bugs.
    pub blocks: Vec<u64>,
    /// Aliases; CVE flaw bugs carry their CVE identifier here.
    pub alias: Vec<String>,
}

/// A comment on a legacy bug. The first comment is the bug's description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugComment {
    pub text: String,
    pub private: bool,
}

/// A failure talking to the legacy tracker.
#[derive(Debug, Error)]
pub enum BugzillaError {
    #[error("{message}")]
    Remote { message: String },
}

impl BugzillaError {
    pub fn remote(message: impl Into<String>) -> Self {
        BugzillaError::Remote {
            message: message.into(),
        }
    }
}

/// Operations the engine needs from the legacy tracker.
pub trait BugzillaClient {
    /// The base URL of the tracker, used to build `show_bug.cgi` links.
    fn base_url(&self) -> &str;

    /// Fetches a bug by ID. `Ok(None)` means the bug does not exist.
    fn get_bug(
        &self,
        id: BugzillaBugId,
    ) -> impl Future<Output = Result<Option<Bug>, BugzillaError>> + Send;

    /// Lists the comments on a bug, oldest first.
    fn list_comments(
        &self,
        id: BugzillaBugId,
    ) -> impl Future<Output = Result<Vec<BugComment>, BugzillaError>> + Send;

    /// Lists the sub-components of a bug, keyed by component name.
    fn list_sub_components(
        &self,
        id: BugzillaBugId,
    ) -> impl Future<Output = Result<HashMap<String, Vec<String>>, BugzillaError>> + Send;
}

/// Builds the canonical URL for a legacy bug.
pub fn bug_url(base_url: &str, id: BugzillaBugId) -> String {
    format!("{}/show_bug.cgi?id={}", base_url.trim_end_matches('/'), id)
}
