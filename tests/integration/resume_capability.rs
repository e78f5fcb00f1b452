//! Integration tests for resume behavior

use tempfile::TempDir;

use commit_tracker::processor::{PlatformSet, Processor, ProcessorOptions, RequestedMode};
use commit_tracker::{Platform, RepositoryDescriptor};

use crate::common::mock_platform::{entry, MockPlatform};

fn descriptor() -> RepositoryDescriptor {
    RepositoryDescriptor {
        item_name: "demo".to_string(),
        github: Some("owner/name".to_string()),
        gist: None,
        gitlab: None,
        bitbucket: None,
    }
}

fn history() -> MockPlatform {
    MockPlatform::with_history(
        Platform::GitHub,
        vec![entry("2024-01-10T10:00:00Z", "first", "sha1")],
    )
}

#[tokio::test]
async fn test_second_run_skips_completed_output() {
    let dir = TempDir::new().unwrap();
    let repos = vec![descriptor()];

    let first = history();
    let platforms = PlatformSet {
        github: Some(Box::new(first)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
    let summary = Processor::new(platforms, options).run(&repos).await;
    assert_eq!(summary.written, 1);

    // Fresh adapter for the second run: the completed table short-circuits
    // before any remote call.
    let second = history();
    let log = second.call_log();
    let platforms = PlatformSet {
        github: Some(Box::new(second)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
    let summary = Processor::new(platforms, options).run(&repos).await;

    assert_eq!(summary.written, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(log.total(), 0);
}

#[tokio::test]
async fn test_no_resume_refetches_existing_output() {
    let dir = TempDir::new().unwrap();
    let repos = vec![descriptor()];

    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
    let platforms = PlatformSet {
        github: Some(Box::new(history())),
        ..Default::default()
    };
    Processor::new(platforms, options).run(&repos).await;

    let second = history();
    let log = second.call_log();
    let platforms = PlatformSet {
        github: Some(Box::new(second)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path())
        .with_mode(RequestedMode::Full)
        .with_resume(false);
    let summary = Processor::new(platforms, options).run(&repos).await;

    assert_eq!(summary.written, 1);
    assert!(log.resolve_calls() >= 1);
}

#[tokio::test]
async fn test_monthly_resume_requeries_only_uncovered_months() {
    let dir = TempDir::new().unwrap();
    let repos = vec![descriptor()];

    let monthly_history = || {
        MockPlatform::with_history(
            Platform::GitHub,
            vec![
                entry("2024-01-10T10:00:00Z", "january", "sha1"),
                entry("2024-02-15T10:00:00Z", "february", "sha2"),
                entry("2024-03-20T10:00:00Z", "march", "sha3"),
            ],
        )
    };

    let platforms = PlatformSet {
        github: Some(Box::new(monthly_history())),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Monthly);
    let summary = Processor::new(platforms, options).run(&repos).await;
    assert_eq!(summary.written, 1);

    let path = dir.path().join("monthly").join("demo_github_monthly.csv");
    let before = std::fs::read_to_string(&path).unwrap();
    assert_eq!(before.lines().count(), 4);

    // Second run: the three covered months are excluded from the query set,
    // the remaining (empty) months produce nothing new.
    let second = monthly_history();
    let log = second.call_log();
    let platforms = PlatformSet {
        github: Some(Box::new(second)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Monthly);
    let summary = Processor::new(platforms, options).run(&repos).await;

    assert_eq!(summary.written, 0);
    assert_eq!(summary.skipped, 1);
    assert!(log.list_calls() > 0);

    let after = std::fs::read_to_string(&path).unwrap();
    assert_eq!(after, before);
}
