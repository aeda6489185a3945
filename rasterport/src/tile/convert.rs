//! The per-tile conversion protocol.
//!
//! Every step is a precondition for the next. Any failure aborts the tile
//! with no marker written; files produced by earlier steps are left in
//! place and picked up again by the next run (raster cache, backup).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::FileTime;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ConvertConfig;
use crate::tool::{ProcessRunner, ToolError, ToolRunner};

use super::{raster, Tile};

/// Result type for tile conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Recoverable failure while converting one tile.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// An external tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A filesystem step failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| ConvertError::Io {
            action,
            path,
            source,
        }
    }
}

/// Converts a single tile.
///
/// The pool hands each tile to exactly one worker, which calls `convert`
/// with exclusive access to it.
pub trait TileConverter: Send + Sync {
    fn convert(&self, tile: &mut Tile) -> ConvertResult<()>;
}

/// Converts Ortho4XP/AutoOrtho tiles by splicing X-Plane 12 raster layers
/// taken from the matching global scenery tile.
pub struct DsfConverter<R = ProcessRunner> {
    config: Arc<ConvertConfig>,
    runner: R,
}

impl DsfConverter<ProcessRunner> {
    /// Create a converter that runs the configured tools as child processes.
    pub fn new(config: Arc<ConvertConfig>) -> Self {
        Self::with_runner(config, ProcessRunner::new())
    }
}

impl<R: ToolRunner> DsfConverter<R> {
    /// Create a converter with a custom tool runner.
    pub fn with_runner(config: Arc<ConvertConfig>, runner: R) -> Self {
        Self { config, runner }
    }

    /// Path of the X-Plane 12 tile the raster layers are taken from.
    pub fn reference_path(&self, tile: &Tile) -> PathBuf {
        self.config.reference_scenery().join(tile.nav_path())
    }

    /// Load the raster lines into the tile, from the cache if present.
    pub fn load_raster(&self, tile: &mut Tile) -> ConvertResult<()> {
        let cache = tile.cache_path();
        if cache.is_file() {
            let lines =
                raster::read_cache(cache).map_err(ConvertError::io("read raster cache", cache))?;
            debug!(tile = %tile, lines = lines.len(), "Using cached raster layers");
            tile.set_raster(lines);
            return Ok(());
        }

        let reference = self.reference_path(tile);
        let text = tile.reference_text_path();
        info!(tile = %tile, reference = %reference.display(), "Extracting raster layers");

        self.runner
            .run(&self.config.dsf_tool().dsf2text(&reference, &text))?;

        let lines =
            raster::extract_raster_file(&text).map_err(ConvertError::io("read", &text))?;
        raster::write_cache(cache, &tile.cache_tmp_path(), &lines)
            .map_err(ConvertError::io("write raster cache", cache))?;
        fs::remove_file(&text).map_err(ConvertError::io("remove", &text))?;

        debug!(tile = %tile, lines = lines.len(), "Cached raster layers");
        tile.set_raster(lines);
        Ok(())
    }

    /// Copy the original tile to its backup path, unless a backup exists.
    ///
    /// Returns `true` when a backup was written.
    pub fn backup(&self, tile: &Tile) -> ConvertResult<bool> {
        let backup = tile.backup_path();
        if backup.exists() {
            debug!(tile = %tile, "Backup already present");
            return Ok(false);
        }

        let original = tile.path();
        let metadata = fs::metadata(original).map_err(ConvertError::io("stat", original))?;
        fs::copy(original, backup).map_err(ConvertError::io("back up to", backup))?;
        filetime::set_file_times(
            backup,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )
        .map_err(ConvertError::io("set times on", backup))?;

        debug!(tile = %tile, backup = %backup.display(), "Backed up original");
        Ok(true)
    }

    /// Decompile the backup, splice in the raster layers, recompile and
    /// repack into `<tile>-new`.
    fn rebuild(&self, tile: &Tile) -> ConvertResult<()> {
        let dsf_tool = self.config.dsf_tool();
        let text = tile.target_text_path();
        let uncompressed = tile.new_uncompressed_path();
        let compressed = tile.new_path();

        self.runner
            .run(&dsf_tool.dsf2text(tile.backup_path(), &text))?;

        let spliced =
            raster::splice_into(&text, tile.raster()).map_err(ConvertError::io("splice", &text))?;
        debug!(tile = %tile, lines = spliced, "Spliced raster layers");

        self.runner.run(&dsf_tool.text2dsf(&text, &uncompressed))?;
        fs::remove_file(&text).map_err(ConvertError::io("remove", &text))?;

        // 7z `a` adds to an existing archive, so a leftover from an
        // interrupted run has to go first.
        remove_if_exists(&compressed)?;
        self.runner.run(
            &self
                .config
                .seven_zip()
                .compress_lzma(&compressed, &uncompressed),
        )?;

        Ok(())
    }

    /// Replace the tile with `<tile>-new`.
    fn swap(&self, tile: &Tile) -> ConvertResult<()> {
        let uncompressed = tile.new_uncompressed_path();
        let compressed = tile.new_path();

        fs::remove_file(&uncompressed).map_err(ConvertError::io("remove", &uncompressed))?;
        fs::rename(&compressed, tile.path()).map_err(ConvertError::io("replace", tile.path()))?;
        Ok(())
    }
}

impl<R: ToolRunner> TileConverter for DsfConverter<R> {
    fn convert(&self, tile: &mut Tile) -> ConvertResult<()> {
        self.load_raster(tile)?;
        self.backup(tile)?;
        self.rebuild(tile)?;
        self.swap(tile)?;

        let marker = tile.marker_path();
        fs::File::create(marker).map_err(ConvertError::io("create marker", marker))?;
        tile.mark_converted();

        info!(tile = %tile, "Converted tile");
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> ConvertResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConvertError::io("remove", path)(e)),
    }
}
