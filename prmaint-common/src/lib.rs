//! # prmaint Common Library
//!
//! Shared code for pull-request maintenance tooling including:
//! - Pull request record model and snapshot I/O
//! - Title normalization and automation-ownership detection
//! - Duplicate detection, canonical selection, and duplicate closing
//! - Configuration loading

pub mod config;
pub mod error;
pub mod maintenance;
pub mod model;
pub mod normalize;
pub mod ownership;
pub mod snapshot;

pub use error::{Error, Result};
pub use maintenance::{
    close_duplicate_pull_requests, CanonicalStrategy, CloseDuplicateOptions, CloseDuplicateResult,
    CloseSummary,
};
pub use model::{PullRequest, PullRequestStatus};
pub use ownership::{IdentifierMatcher, DEFAULT_AI_IDENTIFIERS};
