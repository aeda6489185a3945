//! Progress counters shared between workers and the monitor.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-run tile counters.
///
/// Workers bump `converted` or `failed` once per tile; the monitor and the
/// final summary only read them.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    converted: AtomicUsize,
    failed: AtomicUsize,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_converted(&self) {
        self.converted.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn converted(&self) -> usize {
        self.converted.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Share of `total` that is done, in percent. An empty run is complete.
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 * 100.0 / total as f64
    }
}
