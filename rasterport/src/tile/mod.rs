//! DSF tiles and their conversion.
//!
//! A [`Tile`] is one DSF file inside a scenery package's `Earth nav data`
//! directory. Next to the tile, the conversion keeps two files:
//!
//! ```text
//! Earth nav data/+50+000/
//! ├── +50+008.dsf                      # converted in place
//! ├── +50+008.dsf-pre_o4xp_2_xp12      # backup of the original, written once
//! └── +50+008.dsf-o4xp_2_xp12_done     # empty marker, written last
//! ```
//!
//! and in the work directory a raster cache `<base>.rdata` plus transient
//! text intermediates. The cache is shared by every package holding the
//! same tile; the intermediates carry the package name so that two such
//! tiles can be converted at the same time. The marker is the only record
//! of completion: a tile without it is converted again on the next run.

mod convert;
pub mod raster;

pub use convert::{ConvertError, ConvertResult, DsfConverter, TileConverter};

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Directory that holds DSF tiles in every scenery package.
pub const EARTH_NAV_DATA: &str = "Earth nav data";

/// Suffix of the backup copy of the original tile.
pub const BACKUP_SUFFIX: &str = "-pre_o4xp_2_xp12";

/// Suffix of the conversion-complete marker.
pub const MARKER_SUFFIX: &str = "-o4xp_2_xp12_done";

/// Errors raised when a path cannot be a tile.
#[derive(Debug, Error)]
pub enum TileError {
    /// The path has no `Earth nav data` directory to map onto the reference
    /// scenery.
    #[error("{} is not inside an '{}' directory", .0.display(), EARTH_NAV_DATA)]
    OutsideEarthNavData(PathBuf),

    /// The path has no file name.
    #[error("{} has no file name", .0.display())]
    InvalidFileName(PathBuf),
}

/// One DSF tile scheduled for conversion.
///
/// A tile is owned by exactly one worker while it is converted, so its
/// in-memory raster lines need no synchronization.
#[derive(Debug)]
pub struct Tile {
    path: PathBuf,
    nav_path: PathBuf,
    package: String,
    base: String,
    backup_path: PathBuf,
    marker_path: PathBuf,
    cache_path: PathBuf,
    work_dir: PathBuf,
    raster: Vec<String>,
    converted: bool,
}

impl Tile {
    /// Create a tile for a DSF file, with intermediates under `work_dir`.
    ///
    /// Whether the tile is already converted is decided here, from the
    /// presence of its marker file.
    pub fn new(path: impl Into<PathBuf>, work_dir: &Path) -> Result<Self, TileError> {
        let path = path.into();
        let (package, nav_path) = split_at_earth_nav(&path)
            .ok_or_else(|| TileError::OutsideEarthNavData(path.clone()))?;
        let base = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| TileError::InvalidFileName(path.clone()))?;

        let backup_path = append_suffix(&path, BACKUP_SUFFIX);
        let marker_path = append_suffix(&path, MARKER_SUFFIX);
        let cache_path = work_dir.join(format!("{}.rdata", base));
        let converted = marker_path.is_file();

        Ok(Self {
            path,
            nav_path,
            package,
            base,
            backup_path,
            marker_path,
            cache_path,
            work_dir: work_dir.to_path_buf(),
            raster: Vec::new(),
            converted,
        })
    }

    /// Path of the DSF file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the scenery package, starting at `Earth nav data`.
    pub fn nav_path(&self) -> &Path {
        &self.nav_path
    }

    /// Name of the directory holding `Earth nav data`, e.g.
    /// `zOrtho4XP_+50+008`.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Filename without extension, e.g. `+50+008`.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Per-tile raster cache in the work directory.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Staging file the cache is written to before it is renamed into
    /// place.
    pub fn cache_tmp_path(&self) -> PathBuf {
        self.work_file("rdata.tmp")
    }

    /// Text form of the reference tile.
    pub fn reference_text_path(&self) -> PathBuf {
        self.work_file("txt-xp12")
    }

    /// Text form of the tile being converted.
    pub fn target_text_path(&self) -> PathBuf {
        self.work_file("txt-o4xp")
    }

    fn work_file(&self, extension: &str) -> PathBuf {
        self.work_dir
            .join(format!("{}.{}.{}", self.base, self.package, extension))
    }

    /// Compressed replacement, renamed over the tile at the end.
    pub fn new_path(&self) -> PathBuf {
        append_suffix(&self.path, "-new")
    }

    /// Uncompressed replacement produced by the compiler.
    pub fn new_uncompressed_path(&self) -> PathBuf {
        append_suffix(&self.path, "-new-1")
    }

    /// Raster lines loaded for this tile (empty until loaded).
    pub fn raster(&self) -> &[String] {
        &self.raster
    }

    pub(crate) fn set_raster(&mut self, lines: Vec<String>) {
        self.raster = lines;
    }

    /// Whether the marker file was present at construction, or the tile has
    /// been converted since.
    pub fn is_converted(&self) -> bool {
        self.converted
    }

    pub(crate) fn mark_converted(&mut self) {
        self.converted = true;
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Split `path` into the package directory name and the part from the
/// `Earth nav data` component on.
///
/// Requires at least one component before it (the scenery package) and
/// one after it (the tile).
fn split_at_earth_nav(path: &Path) -> Option<(String, PathBuf)> {
    let components: Vec<_> = path.components().collect();
    let index = components
        .iter()
        .position(|c| c.as_os_str() == OsStr::new(EARTH_NAV_DATA))?;
    if index == 0 || index + 1 >= components.len() {
        return None;
    }
    let package = components[index - 1].as_os_str().to_string_lossy().into_owned();
    Some((package, components[index..].iter().collect()))
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
