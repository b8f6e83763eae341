//! Run log assembly and persistence
//!
//! After the pipeline drains, every fetch record and fetch failure is
//! folded into summary counts and written to the object store as a single
//! JSON document, ready for downstream parsers to pick up.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::store::{ObjectStore, Visibility, CONTENT_TYPE_JSON};

/// Location of an object in the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub path: String,
}

/// Terminal record for one successfully processed task
///
/// `novel` is true only for the task that caused the blob's first write;
/// dedup hits carry `novel = false` and point at the same content path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRecord {
    pub novel: bool,
    pub parser: String,
    pub checksum_index: StoreLocation,
    pub content: StoreLocation,
    pub payload: String,
}

/// Terminal record for one task whose fetch failed at the network layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    pub original_link: String,
    pub clean_link: String,
    pub message: String,
}

/// Summary counts over a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub novel: usize,
    pub errors: usize,
    pub total: usize,
}

/// Run duration expressed in hours, minutes and seconds
///
/// Each field is the full duration in that unit, not a clock breakdown:
/// a 90 second run reports `minutes = 1.5` and `seconds = 90`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DurationSplit {
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl DurationSplit {
    pub fn from_duration(duration: Duration) -> Self {
        let seconds = duration.as_secs_f64();
        Self {
            hours: seconds / 3600.0,
            minutes: seconds / 60.0,
            seconds,
        }
    }
}

/// Run metadata attached to the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub report: Summary,
    pub duration: DurationSplit,
}

/// The complete structured output of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub fetches: Vec<FetchRecord>,
    pub errors: Vec<FetchFailure>,
    pub meta: RunMeta,
}

/// Folds all terminal records into the final run log.
pub fn build_run_log(
    fetches: Vec<FetchRecord>,
    errors: Vec<FetchFailure>,
    duration: Duration,
) -> RunLog {
    let novel = fetches.iter().filter(|f| f.novel).count();
    let report = Summary {
        novel,
        errors: errors.len(),
        total: fetches.len() + errors.len(),
    };
    RunLog {
        fetches,
        errors,
        meta: RunMeta {
            report,
            duration: DurationSplit::from_duration(duration),
        },
    }
}

/// Store path for the run log: `{root}log/{date}_{id}_{offset}_{limit}.json`
pub fn log_path(root: &str, fetch_id: &str, offset: usize, limit: usize, date: NaiveDate) -> String {
    format!(
        "{}log/{}_{}_{}_{}.json",
        root,
        date.format("%Y-%m-%d"),
        fetch_id,
        offset,
        limit
    )
}

/// Serializes the run log and writes it to the store.
pub fn persist_run_log(
    store: &dyn ObjectStore,
    path: &str,
    run_log: &RunLog,
) -> crate::Result<()> {
    let content = serde_json::to_vec_pretty(run_log)?;
    store.put(path, &content, CONTENT_TYPE_JSON, Visibility::Private)?;
    Ok(())
}
