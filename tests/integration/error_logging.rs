//! Integration tests for the append-only error tables

use std::time::Duration;
use tempfile::TempDir;

use commit_tracker::backoff::BackoffPolicy;
use commit_tracker::processor::{PlatformSet, Processor, ProcessorOptions, RequestedMode};
use commit_tracker::{Platform, RepositoryDescriptor};

use crate::common::mock_platform::{entry, MockPlatform};

fn named(item_name: &str) -> RepositoryDescriptor {
    RepositoryDescriptor {
        item_name: item_name.to_string(),
        github: Some("owner/name".to_string()),
        gist: None,
        gitlab: None,
        bitbucket: None,
    }
}

fn descriptor() -> RepositoryDescriptor {
    named("demo")
}

#[tokio::test]
async fn test_not_found_records_error_row() {
    let dir = TempDir::new().unwrap();

    let platforms = PlatformSet {
        github: Some(Box::new(MockPlatform::not_found(Platform::GitHub))),
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
    let lines: Vec<&str> = errors.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("item_name,platform,repository,error"));
    assert!(lines[1].contains("demo"));
    assert!(lines[1].contains("github"));
    assert!(lines[1].contains("owner/name"));
    assert!(lines[1].contains("not_found"));
    assert!(lines[1].contains("404"));
}

#[tokio::test]
async fn test_exhausted_retries_classified_as_rate_limit() {
    let dir = TempDir::new().unwrap();

    let platforms = PlatformSet {
        github: Some(Box::new(MockPlatform::rate_limited(Platform::GitHub))),
        ..Default::default()
    };
    let backoff = BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(2), 1);
    let options = ProcessorOptions::new(dir.path())
        .with_mode(RequestedMode::Full)
        .with_backoff(backoff);
    let summary = Processor::new(platforms, options)
        .run(&[descriptor()])
        .await;

    assert_eq!(summary.failed, 1);

    let errors =
        std::fs::read_to_string(dir.path().join("errors").join("github_errors.csv")).unwrap();
    let row = errors.lines().nth(1).unwrap();
    assert!(row.contains("rate_limit"));
    assert!(row.contains("retries exhausted"));
}

#[tokio::test]
async fn test_write_failure_does_not_abort_batch() {
    let dir = TempDir::new().unwrap();
    // A directory squatting on the first repository's output path makes that
    // table write fail; the batch must still finish the remaining work.
    std::fs::create_dir_all(dir.path().join("blocked.csv")).unwrap();

    let platforms = PlatformSet {
        github: Some(Box::new(MockPlatform::with_history(
            Platform::GitHub,
            vec![entry("2024-01-10T10:00:00Z", "first", "sha1")],
        ))),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path())
        .with_mode(RequestedMode::Full)
        .with_resume(false);

    let repos = vec![named("blocked"), named("ok")];
    let summary = Processor::new(platforms, options).run(&repos).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 1);
    assert!(dir.path().join("ok.csv").is_file());

    let errors =
        std::fs::read_to_string(dir.path().join("errors").join("github_errors.csv")).unwrap();
    let row = errors.lines().nth(1).unwrap();
    assert!(row.contains("blocked"));
    assert!(row.contains("other"));
}

#[tokio::test]
async fn test_error_rows_accumulate_across_runs() {
    let dir = TempDir::new().unwrap();
    let repos = [descriptor()];

    for _ in 0..2 {
        let platforms = PlatformSet {
            github: Some(Box::new(MockPlatform::not_found(Platform::GitHub))),
            ..Default::default()
        };
        let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
        Processor::new(platforms, options).run(&repos).await;
    }

    let errors =
        std::fs::read_to_string(dir.path().join("errors").join("github_errors.csv")).unwrap();
    // One header plus one row per failed run.
    assert_eq!(errors.lines().count(), 3);
}
