//! Write-back workers
//!
//! Each worker drains fetched payloads from the shared result queue and
//! hands them to the content store. A successful resolve emits the task's
//! terminal record and decrements the outstanding counter; a transient
//! store failure puts the payload back on the queue with the counter
//! untouched, so the task stays outstanding until a later attempt lands.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::dedup::{ContentStore, ResolveError};
use crate::pipeline::barrier::WaitGroup;
use crate::pipeline::fetcher::FetchResult;
use crate::pipeline::SharedReceiver;
use crate::report::FetchRecord;
use crate::BulkfetchError;

/// Runs one write-back worker until shutdown is signaled or the result
/// queue closes.
pub async fn write_worker(
    content_store: Arc<ContentStore>,
    results: SharedReceiver<FetchResult>,
    requeue: mpsc::Sender<FetchResult>,
    records: mpsc::Sender<FetchRecord>,
    fatal: mpsc::Sender<BulkfetchError>,
    pending: Arc<WaitGroup>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let fetch = tokio::select! {
            _ = shutdown.changed() => {
                tracing::debug!("Done processing responses");
                return;
            }
            received = async { results.lock().await.recv().await } => match received {
                Some(fetch) => fetch,
                None => return,
            },
        };

        tracing::debug!(
            "{} was fetched (status={}) in {:?}",
            fetch.task.link,
            fetch.status,
            fetch.duration
        );

        match content_store.resolve(fetch) {
            Ok(record) => {
                if records.send(record).await.is_err() {
                    return;
                }
                pending.done();
            }
            Err(ResolveError::Transient { fetch, reason }) => {
                tracing::warn!(
                    "Transient store failure for {}: {}; requeueing",
                    fetch.task.link,
                    reason
                );
                if requeue.send(*fetch).await.is_err() {
                    return;
                }
            }
            Err(ResolveError::Fatal(error)) => {
                let _ = fatal.send(error).await;
                return;
            }
        }
    }
}
