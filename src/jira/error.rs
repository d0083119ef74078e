//! Jira API error types.
//!
//! Expected absences (a missing issue, a missing remote link) are modeled as
//! `Option`/empty values by the client trait, never as errors. `JiraError` is
//! reserved for genuine remote failures, which the engine surfaces once to
//! the caller rather than retrying.

use thiserror::Error;

/// A failure talking to the Jira server.
#[derive(Debug, Error)]
pub enum JiraError {
    /// The server rejected or failed the request. The message is reported
    /// verbatim to the user alongside an instruction to contact an
    /// administrator.
    #[error("{message}")]
    Remote {
        /// HTTP status, when the failure maps to one.
        status: Option<u16>,
        message: String,
    },
}

impl JiraError {
    pub fn remote(message: impl Into<String>) -> Self {
        JiraError::Remote {
            status: None,
            message: message.into(),
        }
    }

    pub fn remote_with_status(status: u16, message: impl Into<String>) -> Self {
        JiraError::Remote {
            status: Some(status),
            message: message.into(),
        }
    }
}
