//! Per-host request throttling
//!
//! The registry enforces a minimum interval between successive fetch starts
//! to the same host. Hosts without a configured policy are never throttled.
//! Each host's compute-sleep-stamp sequence runs under that host's own
//! mutex, so the interval invariant holds no matter how workers are
//! assigned to hosts.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct HostState {
    delay: Duration,
    last_fetch: Option<Instant>,
}

/// Registry of per-host minimum-interval policies
pub struct ThrottleRegistry {
    hosts: HashMap<String, Mutex<HostState>>,
}

impl ThrottleRegistry {
    /// Builds the registry from resolved `(host, delay)` policies.
    pub fn new(policies: Vec<(String, Duration)>) -> Self {
        let hosts = policies
            .into_iter()
            .map(|(host, delay)| {
                (
                    host,
                    Mutex::new(HostState {
                        delay,
                        last_fetch: None,
                    }),
                )
            })
            .collect();
        Self { hosts }
    }

    /// Number of throttled hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Blocks until a request to `host` is allowed, then records the new
    /// fetch start. The first request to a host is never delayed. Unknown
    /// hosts return immediately.
    pub async fn acquire(&self, host: &str) {
        let Some(slot) = self.hosts.get(host) else {
            return;
        };

        let mut state = slot.lock().await;
        if let Some(last) = state.last_fetch {
            tokio::time::sleep_until(last + state.delay).await;
        }
        state.last_fetch = Some(Instant::now());
    }
}
