//! JSON snapshot loading, writing, and integrity validation
//!
//! A snapshot is a JSON array of pull request records as exported from a
//! source-control host. Validation checks the structural and referential
//! rules a maintained snapshot must satisfy (unique numbers, `duplicateOf`
//! references that resolve, closed-only closure metadata, no cycles).

use crate::model::PullRequest;
use crate::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Parse a snapshot from a JSON string
pub fn parse_snapshot(json: &str) -> Result<Vec<PullRequest>> {
    Ok(serde_json::from_str(json)?)
}

/// Load a snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> Result<Vec<PullRequest>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_snapshot(&content)?;
    info!("Loaded {} pull requests from {}", records.len(), path.display());
    Ok(records)
}

/// Write a snapshot as pretty-printed JSON
///
/// The content is written to `<path>.tmp` and renamed over the target so a
/// failed write never leaves a truncated snapshot behind.
pub fn write_snapshot(path: &Path, records: &[PullRequest]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    std::fs::write(tmp_path, json)?;
    if let Err(e) = std::fs::rename(tmp_path, path) {
        let _ = std::fs::remove_file(tmp_path);
        return Err(e.into());
    }

    info!("Wrote {} pull requests to {}", records.len(), path.display());
    Ok(())
}

/// A single integrity problem found in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SnapshotIssue {
    NonPositiveNumber { index: usize },
    DuplicateNumber { number: u64 },
    EmptyTitle { number: u64 },
    EmptyAssignee { number: u64 },
    RepeatedAssignee { number: u64, assignee: String },
    DanglingDuplicateOf { number: u64, duplicate_of: u64 },
    SelfReference { number: u64 },
    DuplicateOfNotClosed { number: u64 },
    DuplicateOfWithoutReason { number: u64 },
    ReasonNotClosed { number: u64 },
    EmptyClosureReason { number: u64 },
    DuplicateCycle { number: u64 },
}

impl fmt::Display for SnapshotIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotIssue::NonPositiveNumber { index } => {
                write!(f, "record at index {} has a non-positive number", index)
            }
            SnapshotIssue::DuplicateNumber { number } => write!(f, "#{} appears more than once", number),
            SnapshotIssue::EmptyTitle { number } => write!(f, "#{} has an empty title", number),
            SnapshotIssue::EmptyAssignee { number } => write!(f, "#{} has an empty assignee", number),
            SnapshotIssue::RepeatedAssignee { number, assignee } => {
                write!(f, "#{} lists assignee '{}' more than once", number, assignee)
            }
            SnapshotIssue::DanglingDuplicateOf { number, duplicate_of } => {
                write!(f, "#{} is a duplicate of #{} which does not exist", number, duplicate_of)
            }
            SnapshotIssue::SelfReference { number } => write!(f, "#{} is a duplicate of itself", number),
            SnapshotIssue::DuplicateOfNotClosed { number } => {
                write!(f, "#{} is marked as a duplicate but is not closed", number)
            }
            SnapshotIssue::DuplicateOfWithoutReason { number } => {
                write!(f, "#{} is marked as a duplicate without a closure reason", number)
            }
            SnapshotIssue::ReasonNotClosed { number } => {
                write!(f, "#{} has a closure reason but is not closed", number)
            }
            SnapshotIssue::EmptyClosureReason { number } => {
                write!(f, "#{} has an empty closure reason", number)
            }
            SnapshotIssue::DuplicateCycle { number } => {
                write!(f, "#{} is part of a duplicateOf cycle", number)
            }
        }
    }
}

/// Outcome of [`validate_snapshot`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub record_count: usize,
    pub open_count: usize,
    pub closed_count: usize,
    pub issues: Vec<SnapshotIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check a snapshot for structural and referential problems
pub fn validate_snapshot(records: &[PullRequest]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen_numbers = HashSet::new();

    for (index, pr) in records.iter().enumerate() {
        if pr.number == 0 {
            issues.push(SnapshotIssue::NonPositiveNumber { index });
        }
        if !seen_numbers.insert(pr.number) {
            issues.push(SnapshotIssue::DuplicateNumber { number: pr.number });
        }
        if pr.title.trim().is_empty() {
            issues.push(SnapshotIssue::EmptyTitle { number: pr.number });
        }

        let mut seen_assignees = HashSet::new();
        for assignee in &pr.assignees {
            if assignee.trim().is_empty() {
                issues.push(SnapshotIssue::EmptyAssignee { number: pr.number });
            } else if !seen_assignees.insert(assignee.as_str()) {
                issues.push(SnapshotIssue::RepeatedAssignee {
                    number: pr.number,
                    assignee: assignee.clone(),
                });
            }
        }

        if let Some(reason) = &pr.closure_reason {
            if reason.trim().is_empty() {
                issues.push(SnapshotIssue::EmptyClosureReason { number: pr.number });
            }
            if !pr.is_closed() {
                issues.push(SnapshotIssue::ReasonNotClosed { number: pr.number });
            }
        }
    }

    for pr in records {
        let Some(target) = pr.duplicate_of else {
            continue;
        };
        if target == pr.number {
            issues.push(SnapshotIssue::SelfReference { number: pr.number });
        } else if !seen_numbers.contains(&target) {
            issues.push(SnapshotIssue::DanglingDuplicateOf {
                number: pr.number,
                duplicate_of: target,
            });
        }
        if !pr.is_closed() {
            issues.push(SnapshotIssue::DuplicateOfNotClosed { number: pr.number });
        }
        if pr.closure_reason.is_none() {
            issues.push(SnapshotIssue::DuplicateOfWithoutReason { number: pr.number });
        }
    }

    for number in find_cycles(records) {
        issues.push(SnapshotIssue::DuplicateCycle { number });
    }

    let closed_count = records.iter().filter(|pr| pr.is_closed()).count();
    debug!("Validated {} records: {} issues", records.len(), issues.len());

    ValidationReport {
        record_count: records.len(),
        open_count: records.len() - closed_count,
        closed_count,
        issues,
    }
}

/// Numbers of records that sit on a `duplicateOf` cycle of length >= 2.
///
/// Self-references are reported separately and are not cycles here.
fn find_cycles(records: &[PullRequest]) -> Vec<u64> {
    let edges: HashMap<u64, u64> = records
        .iter()
        .filter_map(|pr| pr.duplicate_of.filter(|&t| t != pr.number).map(|t| (pr.number, t)))
        .collect();

    let mut on_cycle = HashSet::new();
    let mut cleared = HashSet::new();

    for &start in edges.keys() {
        let mut path = Vec::new();
        let mut position = HashMap::new();
        let mut current = start;

        loop {
            if cleared.contains(&current) || on_cycle.contains(&current) {
                break;
            }
            if let Some(&at) = position.get(&current) {
                on_cycle.extend(path[at..].iter().copied());
                break;
            }
            position.insert(current, path.len());
            path.push(current);
            match edges.get(&current) {
                Some(&next) => current = next,
                None => break,
            }
        }

        cleared.extend(path.into_iter().filter(|n| !on_cycle.contains(n)));
    }

    let mut cycle: Vec<u64> = on_cycle.into_iter().collect();
    cycle.sort_unstable();
    cycle
}
