//! Integration tests for the downloader
//!
//! These tests use wiremock to stand in for the image endpoint and run the
//! full cycle: load registry, download, write files, save registry.

use fake_faces::config::{Config, DownloadConfig, RetryConfig};
use fake_faces::downloader::{HttpFetcher, TaskError, TaskFailure};
use fake_faces::registry::RegistryError;
use fake_faces::storage::{RunStatus, SqliteStorage, Storage};
use fake_faces::{Digest, Registry, SeenRegistry};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Serves `image-<k>` where k advances every `repeat` requests
struct SequentialImages {
    counter: AtomicU64,
    repeat: u64,
}

impl SequentialImages {
    fn unique() -> Self {
        Self::repeating(1)
    }

    fn repeating(repeat: u64) -> Self {
        Self {
            counter: AtomicU64::new(0),
            repeat,
        }
    }
}

impl Respond for SequentialImages {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) / self.repeat;
        ResponseTemplate::new(200)
            .set_body_bytes(format!("image-{}", n).into_bytes())
            .insert_header("content-type", "image/jpeg")
    }
}

/// Accepts a fixed number of new digests, then reports itself unavailable
struct FaultyRegistry {
    inner: SeenRegistry,
    remaining: AtomicUsize,
}

impl Registry for FaultyRegistry {
    fn try_insert(&self, digest: Digest) -> Result<bool, RegistryError> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(RegistryError::Unavailable("injected fault".to_string()));
        }
        let inserted = self.inner.try_insert(digest);
        if inserted {
            self.remaining.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(inserted)
    }

    fn snapshot(&self) -> Vec<Digest> {
        self.inner.snapshot()
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(endpoint: String, max_concurrent: usize) -> Config {
    Config {
        download: DownloadConfig {
            endpoint,
            max_concurrent,
            request_timeout_secs: 5,
            ..DownloadConfig::default()
        },
        retry: RetryConfig {
            network_max_attempts: 3,
            network_base_delay_ms: 1,
            duplicate_base_delay_ms: 1,
            max_delay_ms: 5,
        },
        ..Config::default()
    }
}

fn count_images(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "jpg"))
        .count()
}

#[tokio::test]
async fn test_download_three_unique_images() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequentialImages::unique())
        .expect(3)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path().join("faces");
    let config = create_test_config(mock_server.uri(), 50);

    let result = fake_faces::run(&config, &data_dir, 3).await.unwrap();

    assert!(result.is_complete());
    assert_eq!(result.succeeded(), 3);
    assert_eq!(count_images(&data_dir), 3);

    let registry_path = data_dir.join("seen_images.db");
    assert!(registry_path.exists());
    assert!(!data_dir.join("seen_images.db-wal").exists());

    let storage = SqliteStorage::new(&registry_path).unwrap();
    assert_eq!(storage.count_digests().unwrap(), 3);

    for record in &result.records {
        let bytes = std::fs::read(&record.path).unwrap();
        assert_eq!(fake_faces::hash_bytes(&bytes), record.digest);
    }
}

#[tokio::test]
async fn test_second_run_only_adds_new_images() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequentialImages::unique())
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path();
    let config = create_test_config(mock_server.uri(), 4);

    let first = fake_faces::run(&config, data_dir, 3).await.unwrap();
    let second = fake_faces::run(&config, data_dir, 3).await.unwrap();

    assert!(first.is_complete());
    assert!(second.is_complete());
    assert_eq!(count_images(data_dir), 6);

    let storage = SqliteStorage::new(&data_dir.join("seen_images.db")).unwrap();
    assert_eq!(storage.count_digests().unwrap(), 6);

    let runs = storage.list_runs().unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|run| run.status == RunStatus::Completed));
    assert!(runs.iter().all(|run| run.succeeded == 3));
}

#[tokio::test]
async fn test_previously_seen_images_are_skipped() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequentialImages::unique())
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path();
    let config = create_test_config(mock_server.uri(), 1);

    // The first run saves image-0 and image-1; a fresh server then replays them
    fake_faces::run(&config, data_dir, 2).await.unwrap();

    let replay_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequentialImages::unique())
        .expect(4)
        .mount(&replay_server)
        .await;
    let config = create_test_config(replay_server.uri(), 1);

    let result = fake_faces::run(&config, data_dir, 2).await.unwrap();

    assert!(result.is_complete());
    assert_eq!(count_images(data_dir), 4);
    let saved: Vec<Digest> = result.records.iter().map(|r| r.digest).collect();
    assert!(!saved.contains(&fake_faces::hash_bytes(b"image-0")));
    assert!(!saved.contains(&fake_faces::hash_bytes(b"image-1")));
}

#[tokio::test]
async fn test_duplicates_from_endpoint_are_retried() {
    let mock_server = MockServer::start().await;
    // Every image is served twice in a row
    Mock::given(method("GET"))
        .respond_with(SequentialImages::repeating(2))
        .expect(5)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(mock_server.uri(), 1);

    let result = fake_faces::run(&config, temp_dir.path(), 3).await.unwrap();

    assert!(result.is_complete());
    assert_eq!(count_images(temp_dir.path()), 3);
}

#[tokio::test]
async fn test_server_errors_exhaust_network_attempts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2 * 3)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(mock_server.uri(), 2);

    let result = fake_faces::run(&config, temp_dir.path(), 2).await.unwrap();

    assert_eq!(result.succeeded(), 0);
    assert_eq!(result.failed(), 2);
    assert!(result.failures.iter().all(|f| matches!(
        f,
        TaskFailure::Fatal {
            error: TaskError::Network(_),
            ..
        }
    )));
    assert_eq!(count_images(temp_dir.path()), 0);

    let storage = SqliteStorage::new(&temp_dir.path().join("seen_images.db")).unwrap();
    let runs = storage.list_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Partial);
    assert_eq!(runs[0].failed, 2);
}

#[tokio::test]
async fn test_registry_fault_stops_task_and_keeps_accepted_digests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(SequentialImages::unique())
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(mock_server.uri(), 1);
    let source = Arc::new(HttpFetcher::from_config(&config.download).unwrap());

    let result = fake_faces::run_with(&config, temp_dir.path(), 3, source, |seen| {
        Arc::new(FaultyRegistry {
            inner: seen,
            remaining: AtomicUsize::new(2),
        }) as Arc<dyn Registry>
    })
    .await
    .unwrap();

    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.failed(), 1);
    assert!(matches!(
        result.failures[0],
        TaskFailure::Fatal {
            error: TaskError::Registry(_),
            ..
        }
    ));
    assert_eq!(count_images(temp_dir.path()), 2);

    let storage = SqliteStorage::new(&temp_dir.path().join("seen_images.db")).unwrap();
    assert_eq!(storage.count_digests().unwrap(), 2);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_download() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path().join("never-created");
    let config = create_test_config("ftp://example.com".to_string(), 1);

    let err = fake_faces::run(&config, &data_dir, 1).await.unwrap_err();

    assert!(matches!(err, fake_faces::FacesError::Config(_)));
    assert!(!data_dir.exists());
}
