//! Pull request record model
//!
//! Mirrors the JSON snapshot shape exported from a source-control host:
//!
//! ```json
//! { "number": 105, "title": "...", "status": "closed", "assignees": ["..."],
//!   "author": "...", "duplicateOf": 102, "closureReason": "duplicate-ai-assignee" }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    #[default]
    Open,
    Closed,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "open",
            PullRequestStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pull request record
///
/// `number` is the identity of the record and is never changed by maintenance
/// operations. `duplicate_of` and `closure_reason` are only present once the
/// record has been closed as a duplicate (by this crate or upstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub status: PullRequestStatus,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_reason: Option<String>,
}

impl PullRequest {
    /// Create an open pull request with no assignees
    pub fn new(number: u64, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            status: PullRequestStatus::Open,
            assignees: Vec::new(),
            author: None,
            duplicate_of: None,
            closure_reason: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = assignees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: PullRequestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_open(&self) -> bool {
        self.status == PullRequestStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == PullRequestStatus::Closed
    }
}
