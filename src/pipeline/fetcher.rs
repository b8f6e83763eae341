//! HTTP fetch workers
//!
//! Each worker pulls tasks from the shared bounded queue until it is closed
//! and drained. A task is normalized, throttled by host, fetched with a
//! single GET, hashed, and forwarded downstream. A request failure is
//! terminal for that task; a body-read failure after a successful response
//! aborts the whole run.

use chrono::{DateTime, Utc};
use reqwest::Client;
use sha2::{Digest, Sha384};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use crate::config::Task;
use crate::pipeline::barrier::WaitGroup;
use crate::pipeline::throttle::ThrottleRegistry;
use crate::pipeline::SharedReceiver;
use crate::report::FetchFailure;
use crate::BulkfetchError;

/// One successfully fetched payload, en route to the write-back pool
///
/// Owned exclusively by the write-back worker holding it until the task is
/// terminally resolved.
#[derive(Debug)]
pub struct FetchResult {
    /// The task that initiated the request
    pub task: Task,

    /// Raw response body
    pub body: Vec<u8>,

    /// Hex-encoded SHA-384 digest of the body
    pub checksum: String,

    /// Final HTTP status code
    pub status: u16,

    /// Request URI (path plus query) of the final request
    pub request_uri: String,

    /// Wall-clock start of the fetch
    pub started_at: DateTime<Utc>,

    /// Elapsed time from task pickup to response headers, throttle wait
    /// included
    pub duration: Duration,
}

/// Builds the HTTP client shared by all fetch workers
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Normalizes a configured link for the request: surrounding whitespace is
/// trimmed and interior spaces become `+`. The original link is preserved
/// for identity and reporting.
pub fn normalize_link(link: &str) -> String {
    link.trim().replace(' ', "+")
}

/// Path-plus-query portion of a URL, as recorded in index rows
pub fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Runs one fetch worker until the task queue is closed and drained.
pub async fn fetch_worker(
    client: Client,
    tasks: SharedReceiver<Task>,
    results: mpsc::Sender<FetchResult>,
    failures: mpsc::Sender<FetchFailure>,
    fatal: mpsc::Sender<BulkfetchError>,
    throttle: Arc<ThrottleRegistry>,
    pending: Arc<WaitGroup>,
) {
    loop {
        let task = { tasks.lock().await.recv().await };
        let Some(task) = task else {
            tracing::debug!("No more URLs to process");
            return;
        };

        let started_at = Utc::now();
        let clock = std::time::Instant::now();
        let cleaned = normalize_link(&task.link);

        // Malformed links are not throttled; the GET below reports them.
        if let Some(host) = Url::parse(&cleaned)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            throttle.acquire(&host).await;
        }

        let response = match client.get(cleaned.as_str()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", cleaned, e);
                let failure = FetchFailure {
                    original_link: task.link.clone(),
                    clean_link: cleaned,
                    message: e.to_string(),
                };
                if failures.send(failure).await.is_err() {
                    return;
                }
                pending.done();
                continue;
            }
        };

        let duration = clock.elapsed();
        let status = response.status().as_u16();
        let request_uri = request_uri(response.url());

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let _ = fatal
                    .send(BulkfetchError::BodyRead {
                        url: cleaned,
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        let checksum = hex::encode(Sha384::digest(&body));
        let result = FetchResult {
            task,
            body: body.to_vec(),
            checksum,
            status,
            request_uri,
            started_at,
            duration,
        };
        if results.send(result).await.is_err() {
            return;
        }
    }
}
