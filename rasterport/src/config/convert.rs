//! Run configuration shared by discovery and conversion.
//!
//! `ConvertConfig` is assembled once at startup from command-line flags,
//! the configuration file and built-in defaults, then shared read-only
//! (usually behind an `Arc`) by the scanner and every worker.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::coord::TileRect;
use crate::tool::{DsfTool, SevenZip};

use super::file::ConfigFile;

/// Default number of concurrent conversion workers.
pub const DEFAULT_WORKERS: usize = 10;

/// Default directory for raster caches and text intermediates.
pub const DEFAULT_WORK_DIR: &str = "work";

/// Default `DSFTool` binary, resolved via `PATH`.
pub const DEFAULT_DSF_TOOL: &str = "DSFTool";

/// Default 7-Zip binary, resolved via `PATH`.
pub const DEFAULT_SEVEN_ZIP: &str = "7z";

/// Default interval between progress log lines.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Default bound on how long a worker waits for the queue.
pub const DEFAULT_DEQUEUE_WAIT: Duration = Duration::from_secs(5);

/// Immutable configuration for one conversion run.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    xplane_root: PathBuf,
    dsf_tool: PathBuf,
    seven_zip: PathBuf,
    work_dir: PathBuf,
    rect: Option<TileRect>,
    workers: usize,
    poll_interval: Duration,
    dequeue_wait: Duration,
}

impl ConvertConfig {
    /// Create a configuration for an X-Plane install with defaults.
    pub fn new(xplane_root: impl Into<PathBuf>) -> Self {
        Self {
            xplane_root: xplane_root.into(),
            dsf_tool: PathBuf::from(DEFAULT_DSF_TOOL),
            seven_zip: PathBuf::from(DEFAULT_SEVEN_ZIP),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            rect: None,
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            dequeue_wait: DEFAULT_DEQUEUE_WAIT,
        }
    }

    /// Create a configuration from the config file.
    ///
    /// Values missing from the file keep their defaults. The X-Plane root is
    /// passed separately because it may also come from the command line or
    /// from install detection.
    pub fn from_config_file(xplane_root: impl Into<PathBuf>, file: &ConfigFile) -> Self {
        let mut config = Self::new(xplane_root);
        if let Some(path) = &file.tools.dsf_tool {
            config.dsf_tool = path.clone();
        }
        if let Some(path) = &file.tools.seven_zip {
            config.seven_zip = path.clone();
        }
        if let Some(path) = &file.convert.work_dir {
            config.work_dir = path.clone();
        }
        if let Some(workers) = file.convert.workers {
            config.workers = workers;
        }
        if let Some(secs) = file.convert.poll_interval {
            config.poll_interval = Duration::from_secs(secs);
        }
        config
    }

    /// Set the `DSFTool` binary.
    pub fn with_dsf_tool(mut self, path: impl Into<PathBuf>) -> Self {
        self.dsf_tool = path.into();
        self
    }

    /// Set the 7-Zip binary.
    pub fn with_seven_zip(mut self, path: impl Into<PathBuf>) -> Self {
        self.seven_zip = path.into();
        self
    }

    /// Set the work directory.
    pub fn with_work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = path.into();
        self
    }

    /// Restrict the run to tiles inside a rectangle.
    pub fn with_rect(mut self, rect: Option<TileRect>) -> Self {
        self.rect = rect;
        self
    }

    /// Set the worker count (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the progress log interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the bounded wait used when taking from the queue.
    pub fn with_dequeue_wait(mut self, wait: Duration) -> Self {
        self.dequeue_wait = wait;
        self
    }

    pub fn xplane_root(&self) -> &Path {
        &self.xplane_root
    }

    /// Directory scanned for tiles to convert.
    pub fn custom_scenery(&self) -> PathBuf {
        self.xplane_root.join("Custom Scenery")
    }

    /// Root of the X-Plane 12 global scenery used as raster reference.
    pub fn reference_scenery(&self) -> PathBuf {
        self.xplane_root
            .join("Global Scenery")
            .join("X-Plane 12 Global Scenery")
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn rect(&self) -> Option<TileRect> {
        self.rect
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn dequeue_wait(&self) -> Duration {
        self.dequeue_wait
    }

    /// Command builder for the configured `DSFTool`.
    pub fn dsf_tool(&self) -> DsfTool {
        DsfTool::new(&self.dsf_tool)
    }

    /// Command builder for the configured 7-Zip.
    pub fn seven_zip(&self) -> SevenZip {
        SevenZip::new(&self.seven_zip)
    }
}
