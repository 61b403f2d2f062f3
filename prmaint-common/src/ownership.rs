//! Automation-ownership detection
//!
//! A pull request is automation-owned when its author or any of its assignees
//! mentions a configured identifier (e.g. `chatgpt`, `copilot`) as a whole token.
//! Token boundaries are the start/end of the value or any character that is not a
//! Unicode letter or number, so `"openai-release-bot"` matches `openai` while
//! `"notgpt"` and `"grokowski"` do not match `gpt` or `grok`.

use crate::model::PullRequest;
use regex::Regex;
use tracing::warn;

/// Identifiers used when the caller supplies none.
///
/// Extend by building a new list, e.g.
/// `[DEFAULT_AI_IDENTIFIERS, &["release-bot"]].concat()`.
pub const DEFAULT_AI_IDENTIFIERS: &[&str] = &[
    "chatgpt", "openai", "copilot", "gpt", "cursor", "claude", "grok",
];

const BOUNDARY_BEFORE: &str = r"(?:^|[^\p{L}\p{N}])";
const BOUNDARY_AFTER: &str = r"(?:[^\p{L}\p{N}]|$)";

/// Compiled set of identifier patterns
///
/// Identifiers are trimmed and lower-cased; empty identifiers are discarded.
/// An empty matcher never classifies anything as automation-owned.
#[derive(Debug, Clone)]
pub struct IdentifierMatcher {
    identifiers: Vec<String>,
    patterns: Vec<Regex>,
}

impl IdentifierMatcher {
    /// Build one boundary-aware pattern per identifier
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept = Vec::new();
        let mut patterns = Vec::new();

        for raw in identifiers {
            let identifier = raw.as_ref().trim().to_lowercase();
            if identifier.is_empty() || kept.contains(&identifier) {
                continue;
            }

            let pattern = format!(
                "{}{}{}",
                BOUNDARY_BEFORE,
                regex::escape(&identifier),
                BOUNDARY_AFTER
            );
            match Regex::new(&pattern) {
                Ok(re) => {
                    patterns.push(re);
                    kept.push(identifier);
                }
                Err(e) => {
                    warn!("Ignoring identifier '{}': pattern failed to compile: {}", identifier, e);
                }
            }
        }

        Self {
            identifiers: kept,
            patterns,
        }
    }

    /// Matcher built from [`DEFAULT_AI_IDENTIFIERS`]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_AI_IDENTIFIERS)
    }

    /// Normalized identifiers backing this matcher
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when any identifier appears as a whole token in `value`
    pub fn matches(&self, value: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let value = value.trim().to_lowercase();
        self.patterns.iter().any(|re| re.is_match(&value))
    }

    pub fn is_assigned_to_automation(&self, assignees: &[String]) -> bool {
        assignees.iter().any(|a| self.matches(a))
    }

    /// True when the author or any assignee matches
    pub fn is_automation_owned(&self, pr: &PullRequest) -> bool {
        pr.author.as_deref().is_some_and(|author| self.matches(author))
            || self.is_assigned_to_automation(&pr.assignees)
    }
}

impl Default for IdentifierMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// One-shot check of a single pull request against `identifiers`.
///
/// Prefer building an [`IdentifierMatcher`] once when checking many records.
pub fn is_automation_owned<S: AsRef<str>>(pr: &PullRequest, identifiers: &[S]) -> bool {
    IdentifierMatcher::new(identifiers).is_automation_owned(pr)
}

/// One-shot check of an assignee list against `identifiers`.
pub fn is_assigned_to_automation<S: AsRef<str>>(assignees: &[String], identifiers: &[S]) -> bool {
    IdentifierMatcher::new(identifiers).is_assigned_to_automation(assignees)
}
