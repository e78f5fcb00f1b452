//! Integration tests for redirect resolution across a batch

use tempfile::TempDir;

use commit_tracker::processor::{PlatformSet, Processor, ProcessorOptions, RequestedMode};
use commit_tracker::{Platform, RepositoryDescriptor};

use crate::common::mock_platform::{entry, MockPlatform};

fn descriptor() -> RepositoryDescriptor {
    RepositoryDescriptor {
        item_name: "demo".to_string(),
        github: Some("owner/old".to_string()),
        gist: None,
        gitlab: None,
        bitbucket: None,
    }
}

#[tokio::test]
async fn test_moved_repository_fetched_under_new_identifier() {
    let dir = TempDir::new().unwrap();

    let github = MockPlatform::redirected(
        Platform::GitHub,
        "owner/new",
        vec![entry("2024-01-10T10:00:00Z", "first", "sha1")],
    );
    let log = github.call_log();
    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
    let summary = Processor::new(platforms, options)
        .run(&[descriptor()])
        .await;

    assert_eq!(summary.written, 1);
    assert_eq!(summary.failed, 0);
    // Every history query after resolution targets the new location.
    assert_eq!(log.listed_repos(), vec!["owner/new".to_string()]);
    assert!(dir.path().join("demo.csv").is_file());
}

#[tokio::test]
async fn test_failure_after_redirect_marks_error_row() {
    let dir = TempDir::new().unwrap();

    let platforms = PlatformSet {
        github: Some(Box::new(MockPlatform::redirected_then_not_found(
            Platform::GitHub,
            "owner/new",
        ))),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
    let summary = Processor::new(platforms, options)
        .run(&[descriptor()])
        .await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 0);

    let errors =
        std::fs::read_to_string(dir.path().join("errors").join("github_errors.csv")).unwrap();
    let row = errors.lines().nth(1).unwrap();
    assert!(row.contains("owner/old"));
    assert!(row.contains("not_found"));
    assert!(row.ends_with("Yes"));
}

#[tokio::test]
async fn test_monthly_fetch_queries_new_identifier() {
    let dir = TempDir::new().unwrap();

    let github = MockPlatform::redirected(
        Platform::GitHub,
        "owner/new",
        vec![
            entry("2024-01-10T10:00:00Z", "january", "sha1"),
            entry("2024-02-15T10:00:00Z", "february", "sha2"),
        ],
    );
    let log = github.call_log();
    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Monthly);
    let summary = Processor::new(platforms, options)
        .run(&[descriptor()])
        .await;

    assert_eq!(summary.written, 1);
    let listed = log.listed_repos();
    assert!(!listed.is_empty());
    assert!(listed.iter().all(|repo| repo == "owner/new"));
}
