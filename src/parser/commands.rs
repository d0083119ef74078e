//! Slash-command recognition in comment bodies.
//!
//! Commands must occupy their own line. The flags are independent; a single
//! comment can, in principle, carry more than one command.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::IssueKey;

static REFRESH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^/jira refresh\s*$").expect("refresh pattern must compile")
});

static CC_QA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^/jira cc-qa\s*$").expect("cc-qa pattern must compile")
});

static CHERRYPICK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^/jira cherrypick\s+([A-Za-z0-9-]+)\s*$")
        .expect("cherrypick pattern must compile")
});

/// The commands recognized in a comment body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFlags {
    pub refresh: bool,
    pub cc_qa: bool,
    /// The issue key named by a `/jira cherrypick KEY` command.
    pub cherrypick: Option<IssueKey>,
}

impl CommandFlags {
    pub fn any(&self) -> bool {
        self.refresh || self.cc_qa || self.cherrypick.is_some()
    }
}

/// Scans a comment body for recognized commands.
pub fn parse_commands(body: &str) -> CommandFlags {
    CommandFlags {
        refresh: REFRESH.is_match(body),
        cc_qa: CC_QA.is_match(body),
        cherrypick: CHERRYPICK
            .captures(body)
            .map(|c| IssueKey::new(c[1].to_string())),
    }
}
