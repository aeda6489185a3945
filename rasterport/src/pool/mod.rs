//! Worker pool that drains the tile queue.
//!
//! `ConversionPool::convert` starts a fixed number of worker threads, each
//! taking tiles from the shared [`WorkQueue`] and converting them one at a
//! time. The calling thread does no conversion work: it logs progress at a
//! fixed interval until the queue is drained, then joins the workers.
//!
//! A failed tile is logged and counted; it never stops its worker or the
//! pool. A converter panic counts as a failure. There is no retry within a
//! run. Because the marker is written
//! last, the next run picks the tile up again.

mod progress;
mod queue;

pub use progress::{percent, ProgressCounters};
pub use queue::{Dequeue, WorkQueue};

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{ConvertConfig, DEFAULT_DEQUEUE_WAIT, DEFAULT_POLL_INTERVAL};
use crate::tile::TileConverter;

/// Upper bound on how long the monitor sleeps between checks for finished
/// workers.
const MONITOR_TICK: Duration = Duration::from_millis(100);

/// Errors raised by the pool itself (never by individual tiles).
#[derive(Debug, Error)]
pub enum PoolError {
    /// Not a single worker thread could be started.
    #[error("failed to start worker threads: {0}")]
    Spawn(#[source] io::Error),
}

/// Pool timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Interval between progress log lines.
    pub poll_interval: Duration,
    /// How long a worker waits for the queue lock before trying again.
    pub dequeue_wait: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            dequeue_wait: DEFAULT_DEQUEUE_WAIT,
        }
    }
}

impl From<&ConvertConfig> for PoolConfig {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            dequeue_wait: config.dequeue_wait(),
        }
    }
}

/// Result of a pool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Tiles in the queue when the run started.
    pub queued: usize,
    pub converted: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl ConversionSummary {
    /// Tiles that went through a worker, successfully or not.
    pub fn processed(&self) -> usize {
        self.converted + self.failed
    }
}

/// Fixed-size pool of conversion workers.
pub struct ConversionPool<C> {
    queue: Arc<WorkQueue>,
    converter: Arc<C>,
    config: PoolConfig,
}

impl<C: TileConverter + 'static> ConversionPool<C> {
    pub fn new(queue: Arc<WorkQueue>, converter: C, config: PoolConfig) -> Self {
        Self {
            queue,
            converter: Arc::new(converter),
            config,
        }
    }

    /// Convert every queued tile using `workers` threads.
    ///
    /// Blocks until the queue is drained and all workers have exited.
    pub fn convert(&self, workers: usize) -> Result<ConversionSummary, PoolError> {
        let queued = self.queue.len();
        let started = Instant::now();
        let counters = Arc::new(ProgressCounters::new());

        info!(tiles = queued, workers, "Starting conversion");

        let handles = self.spawn_workers(workers.max(1), &counters)?;

        let tick = MONITOR_TICK
            .min(self.config.poll_interval)
            .max(Duration::from_millis(1));
        let mut next_report = Instant::now();
        while !handles.iter().all(|(_, handle)| handle.is_finished()) {
            if Instant::now() >= next_report {
                let done = queued.saturating_sub(self.queue.len());
                info!("{}/{} = {:.1}% processed", done, queued, percent(done, queued));
                next_report += self.config.poll_interval;
            }
            thread::sleep(tick);
        }

        for (id, handle) in handles {
            if handle.join().is_err() {
                error!(worker = id, "Worker panicked");
            }
        }

        let stranded = self.queue.len();
        if stranded > 0 {
            error!(tiles = stranded, "Workers exited with tiles still queued");
        }

        let summary = ConversionSummary {
            queued,
            converted: counters.converted(),
            failed: counters.failed(),
            elapsed: started.elapsed(),
        };
        info!(
            converted = summary.converted,
            failed = summary.failed,
            "Processed {} tiles in {:.1} seconds",
            summary.processed(),
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    fn spawn_workers(
        &self,
        workers: usize,
        counters: &Arc<ProgressCounters>,
    ) -> Result<Vec<(usize, JoinHandle<()>)>, PoolError> {
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&self.queue),
                converter: Arc::clone(&self.converter),
                counters: Arc::clone(counters),
                dequeue_wait: self.config.dequeue_wait,
            };

            match thread::Builder::new()
                .name(format!("convert-{}", id))
                .spawn(move || worker.run())
            {
                Ok(handle) => handles.push((id, handle)),
                Err(e) if handles.is_empty() => return Err(PoolError::Spawn(e)),
                Err(e) => {
                    warn!(
                        error = %e,
                        started = handles.len(),
                        "Can't start more workers, continuing with fewer"
                    );
                    break;
                }
            }
        }

        Ok(handles)
    }
}

/// One worker thread's state.
struct Worker<C> {
    id: usize,
    queue: Arc<WorkQueue>,
    converter: Arc<C>,
    counters: Arc<ProgressCounters>,
    dequeue_wait: Duration,
}

impl<C: TileConverter> Worker<C> {
    fn run(self) {
        debug!(worker = self.id, "Worker started");

        loop {
            let mut tile = match self.queue.try_take(self.dequeue_wait) {
                Dequeue::Tile(tile) => tile,
                Dequeue::Contended => continue,
                Dequeue::Empty => break,
            };

            info!(worker = self.id, "{} -> S -> {}", self.id, tile);
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| self.converter.convert(&mut tile)));
            match result {
                Ok(Ok(())) => self.counters.record_converted(),
                Ok(Err(e)) => {
                    self.counters.record_failed();
                    warn!(worker = self.id, tile = %tile, error = %e, "Tile conversion failed");
                }
                Err(payload) => {
                    self.counters.record_failed();
                    warn!(
                        worker = self.id,
                        tile = %tile,
                        panic = panic_message(payload.as_ref()),
                        "Tile conversion panicked"
                    );
                }
            }
            info!(worker = self.id, "{} -> E -> {}", self.id, tile);
        }

        debug!(worker = self.id, "Worker finished");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
