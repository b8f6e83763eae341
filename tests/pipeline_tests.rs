//! Integration tests for the fetch pipeline
//!
//! These tests use wiremock to serve deterministic content and run the
//! full pipeline end-to-end against an in-memory object store.

use bulkfetch::config::{Config, FetchConfig, StorageConfig, Task, ThrottleEntry};
use bulkfetch::pipeline::run_pipeline;
use bulkfetch::report::RunLog;
use bulkfetch::store::{MemoryStore, ObjectStore, StoreError, StoreResult, Visibility};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a single-worker test configuration over the given tasks, so
/// fetch and write-back ordering follow the task list.
fn create_test_config(tasks: Vec<Task>) -> Config {
    Config {
        fetch: FetchConfig {
            concurrency: 1,
            write_concurrency: 1,
            offset: 0,
            limit: None,
            id: "1".to_string(),
        },
        storage: StorageConfig {
            dir: "./unused".to_string(),
            root: "test_data".to_string(),
        },
        throttles: vec![],
        indexes: vec![],
        tasks,
    }
}

fn task(link: &str) -> Task {
    Task {
        link: link.to_string(),
        parser: "RawArticle".to_string(),
        payload: "<selector>body</selector>".to_string(),
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Reads the persisted run log back out of the store.
fn load_run_log(store: &MemoryStore) -> RunLog {
    let log_path = store
        .paths()
        .into_iter()
        .find(|p| p.starts_with("test_data/log/"))
        .expect("no run log was written");
    let content = store.get(&log_path).unwrap().unwrap();
    serde_json::from_slice(&content).expect("run log is not valid JSON")
}

#[tokio::test]
async fn test_full_run_with_dedup_and_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/alpha", "alpha content").await;
    mount_page(&server, "/beta", "beta content").await;
    // Same payload as /alpha: a dedup hit, not a new blob.
    mount_page(&server, "/alpha+copy", "alpha content").await;

    let bad_link = "http:/127.0.0.1:1/link";
    let config = create_test_config(vec![
        task(&format!("{}/alpha", base)),
        task(&format!("{}/beta", base)),
        // Surrounding whitespace and an interior space: the request must go
        // out normalized while the log keeps the original link.
        task(&format!("  {}/alpha copy  ", base)),
        task(bad_link),
    ]);

    let store = Arc::new(MemoryStore::new());
    let summary = run_pipeline(&config, store.clone()).await.unwrap();

    assert_eq!(summary.novel, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.total, 4);

    let log = load_run_log(&store);
    assert_eq!(log.meta.report.novel, 2);
    assert_eq!(log.meta.report.errors, 1);
    assert_eq!(log.meta.report.total, 4);

    // The failed task keeps both its original and normalized link.
    assert_eq!(log.errors.len(), 1);
    assert_eq!(log.errors[0].original_link, bad_link);
    assert_eq!(log.errors[0].clean_link, bad_link);
    assert!(!log.errors[0].message.is_empty());

    // The dedup hit points at the same content as the task it duplicates.
    assert_eq!(log.fetches.len(), 3);
    let novel: Vec<_> = log.fetches.iter().filter(|f| f.novel).collect();
    let hits: Vec<_> = log.fetches.iter().filter(|f| !f.novel).collect();
    assert_eq!(novel.len(), 2);
    assert_eq!(hits.len(), 1);
    assert!(novel
        .iter()
        .any(|f| f.content.path == hits[0].content.path));
    assert!(hits[0].content.path.starts_with("test_data/sha384_content/"));

    // The duplicated content's index carries one row per source task.
    let index = store.get(&hits[0].checksum_index.path).unwrap().unwrap();
    let text = String::from_utf8(index).unwrap();
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines.len(), 3, "expected two rows and a trailing newline");
    assert_eq!(*lines.last().unwrap(), "");
    for line in &lines[..2] {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], hits[0].content.path);
        assert_eq!(fields[5], "RawArticle");
    }

    // Exactly one blob per distinct payload.
    let blobs: Vec<_> = store
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("test_data/sha384_content/"))
        .collect();
    assert_eq!(blobs.len(), 2);
}

#[tokio::test]
async fn test_disjoint_slices_cover_the_task_list() {
    let server = MockServer::start().await;
    let base = server.uri();

    for route in ["/one", "/two", "/three", "/four"] {
        mount_page(&server, route, &format!("content of {}", route)).await;
    }

    let tasks = vec![
        task(&format!("{}/one", base)),
        task(&format!("{}/two", base)),
        task(&format!("{}/three", base)),
        task(&format!("{}/four", base)),
    ];
    let store = Arc::new(MemoryStore::new());

    let mut first = create_test_config(tasks.clone());
    first.fetch.offset = 0;
    first.fetch.limit = Some(2);
    let summary = run_pipeline(&first, store.clone()).await.unwrap();
    assert_eq!(summary.total, 2);

    let mut second = create_test_config(tasks);
    second.fetch.offset = 2;
    second.fetch.limit = Some(2);
    let summary = run_pipeline(&second, store.clone()).await.unwrap();
    assert_eq!(summary.total, 2);

    // Both runs wrote their own log, and every task has exactly one blob.
    let logs: Vec<_> = store
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("test_data/log/"))
        .collect();
    assert_eq!(logs.len(), 2);

    let blobs = store
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("test_data/sha384_content/"))
        .count();
    assert_eq!(blobs, 4);
}

#[tokio::test]
async fn test_window_past_end_of_task_list_is_clamped() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/only", "only content").await;

    let mut config = create_test_config(vec![task(&format!("{}/only", base))]);
    config.fetch.offset = 0;
    config.fetch.limit = Some(50);

    let store = Arc::new(MemoryStore::new());
    let summary = run_pipeline(&config, store.clone()).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.novel, 1);

    // An offset beyond the list processes nothing but still completes.
    let mut config = create_test_config(vec![task(&format!("{}/only", base))]);
    config.fetch.offset = 10;
    config.fetch.limit = Some(5);
    config.fetch.id = "2".to_string();

    let summary = run_pipeline(&config, store.clone()).await.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn test_throttled_host_run_completes() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/first", "first content").await;
    mount_page(&server, "/second", "second content").await;

    let mut config = create_test_config(vec![
        task(&format!("{}/first", base)),
        task(&format!("{}/second", base)),
    ]);
    config.throttles = vec![ThrottleEntry {
        host: "127.0.0.1".to_string(),
        delay: 20.0,
        unit: "ms".to_string(),
    }];

    let store = Arc::new(MemoryStore::new());
    let summary = run_pipeline(&config, store).await.unwrap();

    assert_eq!(summary.novel, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.total, 2);
}

/// Store wrapper that fails the first `failures` puts, then recovers.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
        }
    }
}

impl ObjectStore for FlakyStore {
    fn get(&self, path: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(path)
    }

    fn put(
        &self,
        path: &str,
        content: &[u8],
        content_type: &str,
        visibility: Visibility,
    ) -> StoreResult<()> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Backend("injected put failure".to_string()));
        }
        self.inner.put(path, content, content_type, visibility)
    }

    fn delete(&self, path: &str) -> StoreResult<()> {
        self.inner.delete(path)
    }
}

#[tokio::test]
async fn test_transient_write_failure_is_retried_by_requeue() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/flaky", "flaky content").await;

    let config = create_test_config(vec![task(&format!("{}/flaky", base))]);

    // The first two blob writes fail; the task must stay outstanding and
    // resolve on a later attempt.
    let store = Arc::new(FlakyStore::new(2));
    let summary = run_pipeline(&config, store.clone()).await.unwrap();

    assert_eq!(summary.novel, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.total, 1);

    let blob = store
        .inner
        .paths()
        .into_iter()
        .find(|p| p.starts_with("test_data/sha384_content/"))
        .expect("blob was not written");
    assert_eq!(
        store.get(&blob).unwrap().unwrap(),
        b"flaky content".to_vec()
    );
}
