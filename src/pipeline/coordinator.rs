//! Run orchestration
//!
//! Wires the fetch pool, the write-back pool, the throttle registry and
//! the completion counter together, feeds the configured task slice
//! through the bounded queues, and finalizes the run log once every task
//! has a terminal outcome. A fatal error from either pool aborts the run
//! immediately, abandoning in-flight work; there is no other way to stop
//! a run mid-flight.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

use crate::config::{Config, Task};
use crate::dedup::{registry, ContentStore};
use crate::pipeline::barrier::WaitGroup;
use crate::pipeline::fetcher::{build_http_client, fetch_worker, FetchResult};
use crate::pipeline::throttle::ThrottleRegistry;
use crate::pipeline::writer::write_worker;
use crate::report::{build_run_log, log_path, persist_run_log, FetchFailure, FetchRecord};
use crate::store::ObjectStore;
use crate::{BulkfetchError, Result};

/// Capacity of the fetch-result queue. Fetch workers block here when
/// write-back lags, coupling the two pools' throughput.
const RESULT_QUEUE_CAPACITY: usize = 100;

/// Final tallies of one completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub novel: usize,
    pub errors: usize,
    pub total: usize,
    pub duration: Duration,
    pub log_location: String,
}

/// Clamps the configured offset/limit window to the task list.
///
/// Returns the `(start, end)` slice bounds; a window reaching past the end
/// of the list is shortened rather than failing.
pub fn effective_range(len: usize, offset: usize, limit: Option<usize>) -> (usize, usize) {
    let end = match limit {
        Some(limit) => offset.saturating_add(limit).min(len),
        None => len,
    };
    (offset.min(end), end)
}

/// Runs the whole pipeline over the configured task slice and persists the
/// run log. Returns the run summary.
pub async fn run_pipeline(config: &Config, store: Arc<dyn ObjectStore>) -> Result<RunSummary> {
    let run_start = std::time::Instant::now();

    let policies = config.throttle_policies().map_err(BulkfetchError::Config)?;
    let throttle = Arc::new(ThrottleRegistry::new(policies));
    let throttled = throttle.len();
    // One extra fetch worker per throttled host, so slow hosts cannot
    // starve the pool.
    let fetch_workers = config.fetch.concurrency + throttled;
    let write_workers = config.fetch.write_concurrency;

    let (start, end) = effective_range(config.tasks.len(), config.fetch.offset, config.fetch.limit);
    if let Some(limit) = config.fetch.limit {
        if config.fetch.offset.saturating_add(limit) > config.tasks.len() {
            tracing::info!(
                "Forcing fetch window to {} tasks (instead of {})",
                end - start,
                limit
            );
        }
    }
    let slice: Vec<Task> = config.tasks[start..end].to_vec();
    let span = slice.len();
    tracing::info!(
        "Fetching {} URLs of {} in configuration file",
        span,
        config.tasks.len()
    );

    let client = build_http_client()?;
    let content_store = Arc::new(ContentStore::new(
        store.clone(),
        &config.storage.root,
        registry(&config.enabled_indexes()),
    ));

    let (task_tx, task_rx) = mpsc::channel::<Task>(fetch_workers);
    let (result_tx, result_rx) = mpsc::channel::<FetchResult>(RESULT_QUEUE_CAPACITY);
    // Terminal queues hold every outcome of the run, so emitting into them
    // never blocks a worker.
    let (record_tx, mut record_rx) = mpsc::channel::<FetchRecord>(span.max(1));
    let (failure_tx, mut failure_rx) = mpsc::channel::<FetchFailure>(span.max(1));
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<BulkfetchError>(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pending = Arc::new(WaitGroup::new());
    let task_rx = Arc::new(Mutex::new(task_rx));
    let result_rx = Arc::new(Mutex::new(result_rx));

    tracing::info!(
        "Running with {} fetch workers ({} for throttled hosts) and {} write workers",
        fetch_workers,
        throttled,
        write_workers
    );

    let mut fetchers = Vec::with_capacity(fetch_workers);
    for _ in 0..fetch_workers {
        fetchers.push(tokio::spawn(fetch_worker(
            client.clone(),
            task_rx.clone(),
            result_tx.clone(),
            failure_tx.clone(),
            fatal_tx.clone(),
            throttle.clone(),
            pending.clone(),
        )));
    }

    let mut writers = Vec::with_capacity(write_workers);
    for _ in 0..write_workers {
        writers.push(tokio::spawn(write_worker(
            content_store.clone(),
            result_rx.clone(),
            result_tx.clone(),
            record_tx.clone(),
            fatal_tx.clone(),
            pending.clone(),
            shutdown_rx.clone(),
        )));
    }

    // Workers hold their own clones from here on.
    drop(result_tx);
    drop(record_tx);
    drop(failure_tx);
    drop(fatal_tx);

    // Feed the slice through the bounded task queue (backpressure lives
    // there), then wait for every task to resolve; a fatal error from any
    // worker aborts the run instead.
    let feed_and_wait = async {
        for task in slice {
            pending.add(1);
            if task_tx.send(task).await.is_err() {
                break;
            }
        }
        drop(task_tx);
        pending.wait().await;
    };

    tokio::select! {
        _ = feed_and_wait => {}
        Some(error) = fatal_rx.recv() => {
            tracing::error!("Aborting run: {}", error);
            return Err(error);
        }
    }

    // Every task is terminally resolved; writers are idle, stop them.
    let _ = shutdown_tx.send(true);
    for writer in writers {
        let _ = writer.await;
    }
    for fetcher in fetchers {
        let _ = fetcher.await;
    }

    // All worker-held senders are gone; drain the terminal queues.
    let mut fetches = Vec::new();
    while let Some(record) = record_rx.recv().await {
        fetches.push(record);
    }
    let mut errors = Vec::new();
    while let Some(failure) = failure_rx.recv().await {
        errors.push(failure);
    }

    let duration = run_start.elapsed();
    let run_log = build_run_log(fetches, errors, duration);
    let location = log_path(
        content_store.root(),
        &config.fetch.id,
        start,
        end - start,
        Utc::now().date_naive(),
    );
    persist_run_log(store.as_ref(), &location, &run_log)?;
    tracing::info!("Run log written to {}", location);

    Ok(RunSummary {
        novel: run_log.meta.report.novel,
        errors: run_log.meta.report.errors,
        total: run_log.meta.report.total,
        duration,
        log_location: location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_range_clamps_limit_to_list_length() {
        assert_eq!(effective_range(4, 0, Some(10)), (0, 4));
        assert_eq!(effective_range(10, 2, Some(3)), (2, 5));
        assert_eq!(effective_range(10, 0, None), (0, 10));
    }

    #[test]
    fn test_effective_range_clamps_offset_past_end() {
        assert_eq!(effective_range(3, 5, Some(2)), (3, 3));
        assert_eq!(effective_range(3, 5, None), (3, 3));
        assert_eq!(effective_range(0, 0, Some(1)), (0, 0));
    }

    #[test]
    fn test_effective_range_survives_overflowing_window() {
        assert_eq!(effective_range(3, usize::MAX, Some(2)), (3, 3));
        assert_eq!(effective_range(3, 1, Some(usize::MAX)), (1, 3));
    }
}
