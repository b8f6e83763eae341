//! The concurrent fetch pipeline
//!
//! This module contains the core run machinery:
//! - per-host request throttling
//! - the fetch worker pool (normalize, throttle, GET, hash)
//! - the write-back worker pool (dedup, index append, requeue on failure)
//! - the completion counter that decides when the run is done
//! - the coordinator wiring it all together

mod barrier;
mod coordinator;
mod fetcher;
mod throttle;
mod writer;

pub use barrier::WaitGroup;
pub use coordinator::{effective_range, run_pipeline, RunSummary};
pub use fetcher::{build_http_client, normalize_link, request_uri, FetchResult};
pub use throttle::ThrottleRegistry;
pub use writer::write_worker;

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// A queue receiver shared by all workers of one pool
pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;
