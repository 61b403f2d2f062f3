//! Duplicate pull request maintenance
//!
//! Groups pull requests by normalized title, selects one canonical record per
//! duplicate group, and closes the automation-owned duplicates on a cloned copy
//! of the input.
//!
//! # Algorithm
//! 1. Clone every record, preserving input order
//! 2. Group clones by normalized title; single-member groups are skipped
//! 3. Per group: select the canonical record (human-owned records preferred),
//!    then close each open, automation-owned, non-canonical record
//! 4. Report updated records, closed records, and a summary
//!
//! Values for `duplicate_of` and `closure_reason` are only assigned when absent,
//! and records that are already closed are left alone, so running the closer on
//! its own output closes nothing further. Canonical selection is per group and
//! not transitive: a `duplicate_of` pointing at another duplicate is never
//! re-pointed.
//!
//! # Example
//! ```
//! use prmaint_common::{close_duplicate_pull_requests, CloseDuplicateOptions, PullRequest};
//!
//! let records = vec![
//!     PullRequest::new(102, "Track ABACO runtime export directories").with_assignees(["Jeninefer"]),
//!     PullRequest::new(105, "Track ABACO runtime export directories")
//!         .with_assignees(["Jeninefer", "chatgpt-codex-connector"]),
//! ];
//!
//! let result = close_duplicate_pull_requests(&records, CloseDuplicateOptions::default());
//! assert_eq!(result.summary.closed_count, 1);
//! assert_eq!(result.updated[1].duplicate_of, Some(102));
//! ```

use crate::model::{PullRequest, PullRequestStatus};
use crate::normalize::{normalize_title, normalize_title_folded};
use crate::ownership::{IdentifierMatcher, DEFAULT_AI_IDENTIFIERS};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Closure reason stamped on automation-owned duplicates
pub const DEFAULT_CLOSURE_REASON: &str = "duplicate-ai-assignee";

/// Closure reason stamped on human-owned duplicates when those are closed too
pub const DEFAULT_HUMAN_CLOSURE_REASON: &str = "duplicate detected via title normalisation";

/// Error type returned by close observers
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Observer invoked with `(closed, canonical)` for every record closed
pub type CloseObserver<'a> =
    Box<dyn FnMut(&PullRequest, &PullRequest) -> Result<(), ObserverError> + 'a>;

/// Strategy for choosing the canonical record of a duplicate group
///
/// Human-owned records are always preferred; the strategy orders candidates
/// within the preferred subset by `number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalStrategy {
    /// Lowest number wins
    #[default]
    Earliest,
    /// Highest number wins
    Latest,
    /// Lowest-numbered open record wins, falling back to `Earliest`.
    /// Also accepted as `prefer-human`.
    #[serde(alias = "prefer-human", alias = "preferHuman", alias = "preferhuman")]
    EarliestOpen,
}

impl CanonicalStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStrategy::Earliest => "earliest",
            CanonicalStrategy::Latest => "latest",
            CanonicalStrategy::EarliestOpen => "earliest-open",
        }
    }
}

impl fmt::Display for CanonicalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earliest" => Ok(CanonicalStrategy::Earliest),
            "latest" => Ok(CanonicalStrategy::Latest),
            "earliest-open" | "earliest_open" | "earliestopen" | "prefer-human" | "prefer_human"
            | "preferhuman" => Ok(CanonicalStrategy::EarliestOpen),
            other => Err(Error::InvalidInput(format!(
                "Unknown canonical strategy '{}' (expected earliest, latest, or earliest-open)",
                other
            ))),
        }
    }
}

/// Options for [`close_duplicate_pull_requests`]
///
/// Every field is independently defaulted. An empty identifier list disables
/// closing of automation-owned duplicates entirely.
pub struct CloseDuplicateOptions<'a> {
    pub identifiers: Vec<String>,
    pub canonical_strategy: CanonicalStrategy,
    pub closure_reason: String,
    /// Only close duplicates owned by automation (default: true)
    pub require_automation_owner: bool,
    /// Reason used for human-owned duplicates when `require_automation_owner` is false
    pub human_closure_reason: String,
    /// Group titles with diacritics stripped (default: false)
    pub fold_diacritics: bool,
    pub on_close: Option<CloseObserver<'a>>,
}

impl Default for CloseDuplicateOptions<'_> {
    fn default() -> Self {
        Self {
            identifiers: DEFAULT_AI_IDENTIFIERS.iter().map(|s| s.to_string()).collect(),
            canonical_strategy: CanonicalStrategy::default(),
            closure_reason: DEFAULT_CLOSURE_REASON.to_string(),
            require_automation_owner: true,
            human_closure_reason: DEFAULT_HUMAN_CLOSURE_REASON.to_string(),
            fold_diacritics: false,
            on_close: None,
        }
    }
}

impl<'a> CloseDuplicateOptions<'a> {
    pub fn with_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifiers = identifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strategy(mut self, strategy: CanonicalStrategy) -> Self {
        self.canonical_strategy = strategy;
        self
    }

    pub fn with_closure_reason(mut self, reason: impl Into<String>) -> Self {
        self.closure_reason = reason.into();
        self
    }

    pub fn with_require_automation_owner(mut self, require: bool) -> Self {
        self.require_automation_owner = require;
        self
    }

    pub fn with_human_closure_reason(mut self, reason: impl Into<String>) -> Self {
        self.human_closure_reason = reason.into();
        self
    }

    pub fn with_fold_diacritics(mut self, fold: bool) -> Self {
        self.fold_diacritics = fold;
        self
    }

    /// Register the close observer
    ///
    /// Errors returned by the observer and panics raised inside it are logged
    /// and discarded; the record has already been closed when it runs.
    pub fn on_close<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&PullRequest, &PullRequest) -> Result<(), ObserverError> + 'a,
    {
        self.on_close = Some(Box::new(observer));
        self
    }
}

impl fmt::Debug for CloseDuplicateOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseDuplicateOptions")
            .field("identifiers", &self.identifiers)
            .field("canonical_strategy", &self.canonical_strategy)
            .field("closure_reason", &self.closure_reason)
            .field("require_automation_owner", &self.require_automation_owner)
            .field("human_closure_reason", &self.human_closure_reason)
            .field("fold_diacritics", &self.fold_diacritics)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// Counts reported alongside a close run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSummary {
    pub closed_count: usize,
    /// Normalized titles of groups in which at least one record was closed
    pub deduplicated_titles: Vec<String>,
}

/// Result of a close run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseDuplicateResult {
    /// Every input record (cloned), in input order
    pub updated: Vec<PullRequest>,
    /// Records closed by this run, in discovery order
    pub closed: Vec<PullRequest>,
    /// Open non-canonical duplicates left open because they are human-owned
    pub skipped: Vec<PullRequest>,
    /// Canonical record number per duplicate group key
    pub canonical_by_title: BTreeMap<String, u64>,
    pub summary: CloseSummary,
}

/// Select the canonical record among `members` (indices into `records`).
///
/// Returns `None` only for an empty group.
pub fn select_canonical(
    records: &[PullRequest],
    members: &[usize],
    strategy: CanonicalStrategy,
    matcher: &IdentifierMatcher,
) -> Option<usize> {
    let human: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| !matcher.is_automation_owned(&records[i]))
        .collect();
    let candidates: &[usize] = if human.is_empty() { members } else { &human };

    let number = |i: &usize| records[*i].number;

    match strategy {
        CanonicalStrategy::Earliest => candidates.iter().copied().min_by_key(number),
        CanonicalStrategy::Latest => candidates.iter().copied().max_by_key(number),
        CanonicalStrategy::EarliestOpen => candidates
            .iter()
            .copied()
            .filter(|&i| records[i].is_open())
            .min_by_key(number)
            .or_else(|| candidates.iter().copied().min_by_key(number)),
    }
}

/// Close automation-owned duplicate pull requests.
///
/// The input slice is never modified; all changes are applied to clones
/// returned in [`CloseDuplicateResult::updated`]. This function does not fail.
pub fn close_duplicate_pull_requests(
    pull_requests: &[PullRequest],
    options: CloseDuplicateOptions<'_>,
) -> CloseDuplicateResult {
    let CloseDuplicateOptions {
        identifiers,
        canonical_strategy,
        closure_reason,
        require_automation_owner,
        human_closure_reason,
        fold_diacritics,
        mut on_close,
    } = options;

    let matcher = IdentifierMatcher::new(&identifiers);
    let mut updated: Vec<PullRequest> = pull_requests.to_vec();

    // Order-preserving grouping by normalized title
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, pr) in updated.iter().enumerate() {
        let key = if fold_diacritics {
            normalize_title_folded(&pr.title)
        } else {
            normalize_title(&pr.title)
        };
        match group_index.get(&key) {
            Some(&g) => groups[g].1.push(i),
            None => {
                group_index.insert(key.clone(), groups.len());
                groups.push((key, vec![i]));
            }
        }
    }

    let mut closed = Vec::new();
    let mut skipped = Vec::new();
    let mut canonical_by_title = BTreeMap::new();
    let mut deduplicated_titles: Vec<String> = Vec::new();

    for (title, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
        let Some(canonical) = select_canonical(&updated, members, canonical_strategy, &matcher)
        else {
            continue;
        };
        let canonical_number = updated[canonical].number;
        canonical_by_title.insert(title.clone(), canonical_number);
        debug!(
            "Duplicate group '{}': {} records, canonical #{} ({})",
            title,
            members.len(),
            canonical_number,
            canonical_strategy
        );

        for &i in members.iter().filter(|&&i| i != canonical) {
            if updated[i].is_closed() {
                continue;
            }

            let automation_owned = matcher.is_automation_owned(&updated[i]);
            if !automation_owned && require_automation_owner {
                debug!("Keeping human-owned duplicate #{} open", updated[i].number);
                skipped.push(updated[i].clone());
                continue;
            }

            if updated[i].number == canonical_number {
                warn!(
                    "Skipping #{}: shares its number with the canonical record of '{}'",
                    updated[i].number, title
                );
                continue;
            }

            let reason = if automation_owned {
                &closure_reason
            } else {
                &human_closure_reason
            };

            let record = &mut updated[i];
            record.status = PullRequestStatus::Closed;
            if record.duplicate_of.is_none() {
                record.duplicate_of = Some(canonical_number);
            }
            if record.closure_reason.is_none() {
                record.closure_reason = Some(reason.clone());
            }
            info!("Closed #{} as duplicate of #{}", record.number, canonical_number);

            closed.push(record.clone());
            if !deduplicated_titles.contains(title) {
                deduplicated_titles.push(title.clone());
            }

            if let Some(observer) = on_close.as_mut() {
                notify_observer(observer, &updated[i], &updated[canonical]);
            }
        }
    }

    CloseDuplicateResult {
        updated,
        summary: CloseSummary {
            closed_count: closed.len(),
            deduplicated_titles,
        },
        closed,
        skipped,
        canonical_by_title,
    }
}

/// Invoke the observer, isolating both returned errors and panics
fn notify_observer(observer: &mut CloseObserver<'_>, duplicate: &PullRequest, canonical: &PullRequest) {
    match panic::catch_unwind(AssertUnwindSafe(|| observer(duplicate, canonical))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!("Close observer failed for #{}: {}", duplicate.number, e);
        }
        Err(_) => {
            warn!("Close observer panicked for #{}", duplicate.number);
        }
    }
}
