//! Integration tests for batch processing and mode selection

use tempfile::TempDir;

use commit_tracker::processor::{PlatformSet, Processor, ProcessorOptions, RequestedMode};
use commit_tracker::{Platform, RepositoryDescriptor};

use crate::common::mock_platform::{entry, MockPlatform};

fn descriptor(github: Option<&str>, gitlab: Option<&str>) -> RepositoryDescriptor {
    RepositoryDescriptor {
        item_name: "demo".to_string(),
        github: github.map(String::from),
        gist: None,
        gitlab: gitlab.map(String::from),
        bitbucket: None,
    }
}

#[tokio::test]
async fn test_full_history_written_per_platform() {
    let dir = TempDir::new().unwrap();

    let github = MockPlatform::with_history(
        Platform::GitHub,
        vec![
            entry("2024-03-01T10:00:00Z", "second", "sha2"),
            entry("2024-01-10T10:00:00Z", "first", "sha1"),
        ],
    );
    let gitlab = MockPlatform::with_history(
        Platform::GitLab,
        vec![entry("2024-02-01T10:00:00Z", "only", "sha3")],
    );

    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        gitlab: Some(Box::new(gitlab)),
        ..Default::default()
    };
    let options = ProcessorOptions::new(dir.path()).with_mode(RequestedMode::Full);
    let processor = Processor::new(platforms, options);

    let repos = vec![descriptor(Some("owner/name"), Some("group/proj"))];
    let summary = processor.run(&repos).await;

    assert_eq!(summary.written, 2);
    assert_eq!(summary.failed, 0);

    let github_out = std::fs::read_to_string(dir.path().join("demo.csv")).unwrap();
    assert_eq!(github_out.lines().count(), 3);
    assert!(github_out.starts_with("item_name,date,message,sha,author\n"));
    assert!(github_out.contains("sha1"));
    assert!(github_out.contains("sha2"));

    let gitlab_out = std::fs::read_to_string(dir.path().join("demo_gitlab.csv")).unwrap();
    assert_eq!(gitlab_out.lines().count(), 2);
    assert!(gitlab_out.contains("sha3"));
}

#[tokio::test]
async fn test_auto_mode_small_history_fetches_full() {
    let dir = TempDir::new().unwrap();

    let github = MockPlatform::with_history(
        Platform::GitHub,
        vec![entry("2024-01-10T10:00:00Z", "first", "sha1")],
    );
    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        ..Default::default()
    };
    let processor = Processor::new(platforms, ProcessorOptions::new(dir.path()));

    let repos = vec![descriptor(Some("owner/name"), None)];
    let summary = processor.run(&repos).await;

    assert_eq!(summary.written, 1);
    assert!(dir.path().join("demo.csv").exists());
    assert!(!dir.path().join("demo_yearly.csv").exists());
}

#[tokio::test]
async fn test_auto_mode_large_history_samples_yearly() {
    let dir = TempDir::new().unwrap();

    // Commit count says "large", so auto mode samples one commit per year.
    let github = MockPlatform::with_history(
        Platform::GitHub,
        vec![
            entry("2023-02-01T10:00:00Z", "in 2023", "sha1"),
            entry("2024-06-01T10:00:00Z", "in 2024", "sha2"),
        ],
    )
    .with_commit_count(5000);

    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        ..Default::default()
    };
    let processor = Processor::new(platforms, ProcessorOptions::new(dir.path()));

    let repos = vec![descriptor(Some("owner/name"), None)];
    let summary = processor.run(&repos).await;

    assert_eq!(summary.written, 1);
    let out = std::fs::read_to_string(dir.path().join("demo_yearly.csv")).unwrap();
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("item_name,date,message,sha,author,year"));
    assert!(out.contains(",2023"));
    assert!(out.contains(",2024"));
}

#[tokio::test]
async fn test_empty_history_writes_no_file() {
    let dir = TempDir::new().unwrap();

    let github = MockPlatform::with_history(Platform::GitHub, Vec::new());
    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        ..Default::default()
    };
    let processor = Processor::new(platforms, ProcessorOptions::new(dir.path()));

    let repos = vec![descriptor(Some("owner/name"), None)];
    let summary = processor.run(&repos).await;

    assert_eq!(summary.written, 0);
    assert_eq!(summary.skipped, 1);
    assert!(!dir.path().join("demo.csv").exists());
}

#[tokio::test]
async fn test_rows_without_identifiers_touch_no_platform() {
    let dir = TempDir::new().unwrap();

    let github = MockPlatform::with_history(
        Platform::GitHub,
        vec![entry("2024-01-10T10:00:00Z", "first", "sha1")],
    );
    let log = github.call_log();
    let platforms = PlatformSet {
        github: Some(Box::new(github)),
        ..Default::default()
    };
    let processor = Processor::new(platforms, ProcessorOptions::new(dir.path()));

    let repos = vec![descriptor(None, Some("group/proj"))];
    let summary = processor.run(&repos).await;

    // The GitLab identifier has no configured adapter and the GitHub adapter
    // has no identifier; nothing runs.
    assert_eq!(summary.written, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(log.total(), 0);
}
