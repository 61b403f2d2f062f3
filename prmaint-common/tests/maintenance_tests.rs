//! Integration tests for duplicate pull request maintenance
//!
//! Covers:
//! - Basic duplicate closure and its negative counterpart
//! - Latest-strategy canonical selection
//! - Custom and extended identifier lists
//! - Word-boundary identifier matching
//! - Behavior against the JSON snapshot fixture

use prmaint_common::maintenance::DEFAULT_HUMAN_CLOSURE_REASON;
use prmaint_common::snapshot::{parse_snapshot, validate_snapshot};
use prmaint_common::{
    close_duplicate_pull_requests, CanonicalStrategy, CloseDuplicateOptions, PullRequest,
    PullRequestStatus, DEFAULT_AI_IDENTIFIERS,
};

const FIXTURE: &str = include_str!("fixtures/pull_requests.json");

const ABACO_TITLE: &str = "Track ABACO runtime export directories";

fn fixture() -> Vec<PullRequest> {
    parse_snapshot(FIXTURE).expect("fixture parses")
}

fn find(records: &[PullRequest], number: u64) -> &PullRequest {
    records
        .iter()
        .find(|pr| pr.number == number)
        .unwrap_or_else(|| panic!("#{} present", number))
}

fn numbers(records: &[PullRequest]) -> Vec<u64> {
    records.iter().map(|pr| pr.number).collect()
}

fn abaco_records(duplicate_assignee: &str) -> Vec<PullRequest> {
    vec![
        PullRequest::new(102, ABACO_TITLE)
            .with_author("Jeninefer")
            .with_assignees(["Jeninefer"]),
        PullRequest::new(103, "Add ledger reconciliation").with_assignees(["Jeninefer"]),
        PullRequest::new(104, "Document KPI formulas").with_assignees(["Jeninefer"]),
        PullRequest::new(105, ABACO_TITLE)
            .with_author("Jeninefer")
            .with_assignees(["Jeninefer", duplicate_assignee]),
    ]
}

#[test]
fn test_basic_duplicate_closure() {
    let records = abaco_records("chatgpt-codex-connector");

    let result = close_duplicate_pull_requests(&records, CloseDuplicateOptions::default());

    assert_eq!(result.summary.closed_count, 1);
    assert_eq!(numbers(&result.closed), vec![105]);
    assert_eq!(
        result.summary.deduplicated_titles,
        vec!["track abaco runtime export directories".to_string()]
    );

    let closed = find(&result.updated, 105);
    assert_eq!(closed.status, PullRequestStatus::Closed);
    assert_eq!(closed.duplicate_of, Some(102));
    assert_eq!(closed.closure_reason.as_deref(), Some("duplicate-ai-assignee"));

    let canonical = find(&result.updated, 102);
    assert_eq!(canonical.status, PullRequestStatus::Open);
    assert!(canonical.duplicate_of.is_none());
    assert!(canonical.closure_reason.is_none());

    // Output preserves input order
    assert_eq!(numbers(&result.updated), vec![102, 103, 104, 105]);
}

#[test]
fn test_no_automation_ownership_means_no_closure() {
    let records = abaco_records("automation-bot");

    let result = close_duplicate_pull_requests(&records, CloseDuplicateOptions::default());

    assert!(result.closed.is_empty());
    assert_eq!(result.summary.closed_count, 0);
    assert!(result.summary.deduplicated_titles.is_empty());

    let untouched = find(&result.updated, 105);
    assert_eq!(untouched.status, PullRequestStatus::Open);
    assert!(untouched.duplicate_of.is_none());
    assert_eq!(numbers(&result.skipped), vec![105]);
}

#[test]
fn test_latest_strategy_selection() {
    let records: Vec<PullRequest> = (1..=3)
        .map(|n| PullRequest::new(n, "Bump dependencies").with_author("copilot"))
        .collect();

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_strategy(CanonicalStrategy::Latest),
    );

    assert_eq!(result.canonical_by_title.get("bump dependencies"), Some(&3));
    assert_eq!(numbers(&result.closed), vec![1, 2]);
    for number in [1, 2] {
        let pr = find(&result.updated, number);
        assert!(pr.is_closed());
        assert_eq!(pr.duplicate_of, Some(3));
    }
    assert!(find(&result.updated, 3).is_open());
}

#[test]
fn test_custom_identifier_list_excludes_unlisted_markers() {
    let records = abaco_records("automation-bot");

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_identifiers(["chatgpt"]),
    );

    assert_eq!(result.summary.closed_count, 0);
}

#[test]
fn test_extended_identifier_list() {
    let records = vec![
        PullRequest::new(10, "Cut release 1.2").with_author("maintainer"),
        PullRequest::new(11, "Cut release 1.2").with_author("openai-release-bot"),
    ];
    let identifiers = [DEFAULT_AI_IDENTIFIERS, &["release-bot"]].concat();

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_identifiers(identifiers),
    );

    assert_eq!(numbers(&result.closed), vec![11]);
    assert_eq!(find(&result.updated, 11).duplicate_of, Some(10));
}

#[test]
fn test_word_boundary_author_is_not_automation() {
    let records = vec![
        PullRequest::new(20, "Tune model prompts").with_author("maintainer"),
        PullRequest::new(21, "Tune model prompts").with_author("notgpt"),
    ];

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_identifiers(["gpt"]),
    );

    assert_eq!(result.summary.closed_count, 0);
    assert!(find(&result.updated, 21).is_open());
}

#[test]
fn test_empty_identifier_list_disables_closing() {
    let records = abaco_records("chatgpt-codex-connector");

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_identifiers(Vec::<String>::new()),
    );

    assert_eq!(result.summary.closed_count, 0);
    assert_eq!(result.updated, records);
}

#[test]
fn test_custom_closure_reason() {
    let records = abaco_records("chatgpt-codex-connector");

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_closure_reason("bot-duplicate"),
    );

    assert_eq!(find(&result.updated, 105).closure_reason.as_deref(), Some("bot-duplicate"));
}

#[test]
fn test_observer_receives_duplicate_and_canonical() {
    let records = vec![
        PullRequest::new(1, "Same").with_author("maintainer"),
        PullRequest::new(2, "Same").with_author("ChatGPT Helper"),
        PullRequest::new(3, "Same")
            .with_author("contributor")
            .with_assignees(["GitHub Copilot"]),
    ];
    let mut closures = Vec::new();

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().on_close(|duplicate, canonical| {
            assert!(duplicate.is_closed());
            closures.push((duplicate.number, canonical.number));
            Ok(())
        }),
    );

    assert_eq!(result.summary.closed_count, 2);
    assert_eq!(closures, vec![(2, 1), (3, 1)]);
}

#[test]
fn test_failing_observer_does_not_abort_run() {
    let records = vec![
        PullRequest::new(1, "Same").with_author("Alice"),
        PullRequest::new(2, "Same").with_author("C++Bot"),
        PullRequest::new(3, "Same").with_author("Reviewer").with_assignees(["c++bot"]),
    ];
    let mut attempts = 0;

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default()
            .with_identifiers(["c++bot"])
            .on_close(|_, _| {
                attempts += 1;
                if attempts == 1 {
                    Err("transient failure".into())
                } else {
                    Ok(())
                }
            }),
    );

    assert_eq!(attempts, 2);
    assert_eq!(numbers(&result.closed), vec![2, 3]);
}

#[test]
fn test_closing_human_duplicates_when_configured() {
    let records = abaco_records("automation-bot");

    let result = close_duplicate_pull_requests(
        &records,
        CloseDuplicateOptions::default().with_require_automation_owner(false),
    );

    let closure = find(&result.closed, 105);
    assert_eq!(closure.closure_reason.as_deref(), Some(DEFAULT_HUMAN_CLOSURE_REASON));
    assert_eq!(closure.duplicate_of, Some(102));
    assert!(result.skipped.is_empty());
}

#[test]
fn test_fixture_default_run() {
    let records = fixture();

    let result = close_duplicate_pull_requests(&records, CloseDuplicateOptions::default());

    assert_eq!(numbers(&result.closed), vec![403, 106, 105]);
    assert_eq!(numbers(&result.skipped), vec![402, 303, 107]);
    assert_eq!(result.canonical_by_title.get("improve search accuracy"), Some(&101));
    assert_eq!(result.canonical_by_title.get("fix nightly deployment"), Some(&401));
    assert_eq!(
        result.summary.deduplicated_titles,
        vec![
            "fix nightly deployment".to_string(),
            "improve search accuracy".to_string(),
            "track abaco runtime export directories".to_string(),
        ]
    );

    // Accented and unaccented titles stay in separate groups by default
    assert!(!result.canonical_by_title.contains_key("añadir informe de costos"));
    assert!(find(&result.updated, 202).is_open());

    // The already-closed record keeps its upstream metadata
    let stale = find(&result.updated, 401);
    assert_eq!(stale.closure_reason.as_deref(), Some("stale"));
    assert!(stale.duplicate_of.is_none());

    assert!(validate_snapshot(&result.updated).is_valid());
}

#[test]
fn test_fixture_earliest_open_strategy() {
    let result = close_duplicate_pull_requests(
        &fixture(),
        CloseDuplicateOptions::default().with_strategy(CanonicalStrategy::EarliestOpen),
    );

    assert_eq!(result.canonical_by_title.get("fix nightly deployment"), Some(&402));
    assert_eq!(find(&result.updated, 403).duplicate_of, Some(402));
}

#[test]
fn test_fixture_prefer_human_skips_closed_canonical() {
    let strategy: CanonicalStrategy = "preferHuman".parse().unwrap();
    let result = close_duplicate_pull_requests(
        &fixture(),
        CloseDuplicateOptions::default().with_strategy(strategy),
    );

    assert_eq!(result.canonical_by_title.get("fix nightly deployment"), Some(&402));
    assert!(find(&result.updated, 402).is_open());
    assert!(find(&result.updated, 401).is_closed());
}

#[test]
fn test_fixture_extended_identifiers() {
    let identifiers = [DEFAULT_AI_IDENTIFIERS, &["qa-automation"]].concat();

    let result = close_duplicate_pull_requests(
        &fixture(),
        CloseDuplicateOptions::default().with_identifiers(identifiers),
    );

    assert!(numbers(&result.closed).contains(&302));
    assert_eq!(find(&result.updated, 302).duplicate_of, Some(303));
    // Singletons are never touched, even when automation-owned
    assert!(find(&result.updated, 103).is_open());
}

#[test]
fn test_fixture_fold_diacritics() {
    let result = close_duplicate_pull_requests(
        &fixture(),
        CloseDuplicateOptions::default().with_fold_diacritics(true),
    );

    assert_eq!(result.canonical_by_title.get("anadir informe de costos"), Some(&201));
    assert_eq!(find(&result.updated, 202).duplicate_of, Some(201));
}

#[test]
fn test_fixture_input_is_not_mutated() {
    let records = fixture();
    let snapshot = records.clone();

    let _ = close_duplicate_pull_requests(&records, CloseDuplicateOptions::default());

    assert_eq!(records, snapshot);
}

#[test]
fn test_fixture_second_run_is_idempotent() {
    let first = close_duplicate_pull_requests(&fixture(), CloseDuplicateOptions::default());
    let second = close_duplicate_pull_requests(&first.updated, CloseDuplicateOptions::default());

    assert_eq!(second.summary.closed_count, 0);
    assert_eq!(second.updated, first.updated);
}
