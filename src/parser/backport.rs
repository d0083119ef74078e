//! Backport marker detection.
//!
//! The cherry-pick automation opens backport pull requests whose body starts
//! with a structured marker naming the source pull request. The marker is
//! anchored to a line start so quoted copies in later discussion don't match.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::PrNumber;

static BACKPORT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^This is an automated cherry-pick of #([0-9]+)")
        .expect("backport marker pattern must compile")
});

/// Extracts the source pull request number from a backport marker in a PR
/// body, if one is present.
pub fn backport_source(body: &str) -> Option<PrNumber> {
    let captures = BACKPORT_MARKER.captures(body)?;
    captures[1].parse::<u64>().ok().map(PrNumber)
}

/// Renders the marker body the automation writes, used by tests to stay in
/// sync with the format being matched.
pub fn backport_body(source: PrNumber, requestor: Option<&str>, note: Option<&str>) -> String {
    let mut body = format!("This is an automated cherry-pick of #{}", source.0);
    if let Some(requestor) = requestor {
        body.push_str(&format!("\n\n/assign {requestor}"));
    }
    if let Some(note) = note {
        body.push_str(&format!("\n\n{note}"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_variants_all_match() {
        let cases = [
            (None, None),
            (Some("user"), None),
            (None, Some("this is a test")),
            (Some("user"), Some("this is a test")),
        ];
        for (requestor, note) in cases {
            let body = backport_body(PrNumber(123), requestor, note);
            assert_eq!(
                backport_source(&body),
                Some(PrNumber(123)),
                "body: {body:?}"
            );
        }
    }

    #[test]
    fn marker_must_start_a_line() {
        assert_eq!(
            backport_source("note: This is an automated cherry-pick of #2"),
            None
        );
        assert_eq!(
            backport_source("intro\nThis is an automated cherry-pick of #2\n\n/assign user"),
            Some(PrNumber(2))
        );
    }

    #[test]
    fn unrelated_bodies_do_not_match() {
        assert_eq!(backport_source("This PR fixes OCPBUGS-123"), None);
        assert_eq!(backport_source(""), None);
    }
}
