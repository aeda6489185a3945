//! Discovery of tiles to convert.
//!
//! Walks `Custom Scenery` for scenery packages produced by Ortho4XP
//! (`zOrtho4XP_*`) or AutoOrtho (`z_autoortho/scenery/z_ao_*`) and queues
//! every DSF tile in them that is not converted yet. An optional
//! [`TileRect`] restricts the run to a region.
//!
//! Symlinked packages are followed. Entries below the root that cannot be
//! read (broken links, stale mounts, permission errors) are logged and
//! skipped; only an unreadable root stops the scan.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ConvertConfig;
use crate::coord::{DsfTileCoord, TileRect};
use crate::pool::WorkQueue;
use crate::tile::{Tile, TileError};

/// Result type for scanning.
pub type ScanResult<T> = Result<T, ScanError>;

/// Fatal discovery errors. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root could not be read.
    #[error("failed to scan {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A DSF filename could not be parsed while a rectangle is active.
    #[error("{} is not a valid DSF tile name", .0.display())]
    InvalidTileName(PathBuf),

    /// A tile has no `Earth nav data` directory to map onto the reference
    /// scenery.
    #[error("{} is not inside an 'Earth nav data' directory", .0.display())]
    OutsideEarthNavData(PathBuf),
}

impl From<TileError> for ScanError {
    fn from(err: TileError) -> Self {
        match err {
            TileError::OutsideEarthNavData(path) => ScanError::OutsideEarthNavData(path),
            TileError::InvalidFileName(path) => ScanError::InvalidTileName(path),
        }
    }
}

/// Counts from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// DSF files found in matching packages.
    pub found: usize,
    /// Skipped because they lie outside the rectangle.
    pub outside_rect: usize,
    /// Skipped because their marker exists.
    pub already_converted: usize,
    /// Pushed onto the work queue.
    pub queued: usize,
    /// Entries below the root that could not be read.
    pub unreadable: usize,
}

/// Package directory patterns, searched anywhere in the path below the
/// scan root.
fn package_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"zOrtho4XP_.*").unwrap(),
            Regex::new(r"z_autoortho.scenery.z_ao_[a-z]+").unwrap(),
        ]
    })
}

/// Whether a directory (relative to the scan root) belongs to a package
/// this tool converts.
pub fn is_package_dir(relative: &Path) -> bool {
    let path = relative.to_string_lossy();
    package_patterns().iter().any(|p| p.is_match(&path))
}

/// Finds convertible tiles below `Custom Scenery`.
#[derive(Debug, Clone)]
pub struct TileScanner {
    root: PathBuf,
    work_dir: PathBuf,
    rect: Option<TileRect>,
}

impl TileScanner {
    /// Create a scanner for the configured install.
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            root: config.custom_scenery(),
            work_dir: config.work_dir().to_path_buf(),
            rect: config.rect(),
        }
    }

    /// Directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the scan root and push every pending tile onto `queue`.
    pub fn scan(&self, queue: &WorkQueue) -> ScanResult<ScanReport> {
        let mut report = ScanReport::default();
        info!(
            root = %self.root.display(),
            rect = ?self.rect.map(|r| r.to_string()),
            "Scanning for tiles"
        );

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(ScanError::Walk {
                        root: self.root.clone(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    report.unreadable += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_dsf(entry.path()) {
                continue;
            }

            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
            if !is_package_dir(relative) {
                continue;
            }

            report.found += 1;

            if let Some(rect) = &self.rect {
                let name = entry.file_name().to_string_lossy();
                let coord = DsfTileCoord::from_dsf_filename(&name)
                    .ok_or_else(|| ScanError::InvalidTileName(entry.path().to_path_buf()))?;
                if !rect.contains(coord) {
                    debug!(tile = %entry.path().display(), "Outside rectangle");
                    report.outside_rect += 1;
                    continue;
                }
            }

            let tile = Tile::new(entry.path(), &self.work_dir)?;
            if tile.is_converted() {
                debug!(tile = %tile, "Already converted");
                report.already_converted += 1;
                continue;
            }

            info!(tile = %tile, "Queued tile");
            queue.push(tile);
            report.queued += 1;
        }

        info!(
            found = report.found,
            outside_rect = report.outside_rect,
            already_converted = report.already_converted,
            queued = report.queued,
            unreadable = report.unreadable,
            "Scan complete"
        );
        Ok(report)
    }
}

fn is_dsf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "dsf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"dsf").unwrap();
    }

    fn nav(root: &Path, package: &str) -> PathBuf {
        root.join("Custom Scenery")
            .join(package)
            .join("Earth nav data")
            .join("+50+000")
    }

    fn scan(root: &Path, rect: Option<&str>) -> ScanResult<(ScanReport, Vec<PathBuf>)> {
        let config = ConvertConfig::new(root)
            .with_work_dir(root.join("work"))
            .with_rect(rect.map(|r| r.parse().unwrap()));
        let queue = WorkQueue::new();
        let report = TileScanner::new(&config).scan(&queue)?;
        let mut paths: Vec<PathBuf> = queue.drain().map(|t| t.path().to_path_buf()).collect();
        paths.sort();
        Ok((report, paths))
    }

    #[test]
    fn test_package_patterns() {
        assert!(is_package_dir(Path::new("zOrtho4XP_+50+008/Earth nav data/+50+000")));
        assert!(is_package_dir(Path::new("z_autoortho/scenery/z_ao_eur/Earth nav data/+50+000")));
        assert!(!is_package_dir(Path::new("z_autoortho/scenery/z_ao_/Earth nav data")));
        assert!(!is_package_dir(Path::new("KSEA Demo Area/Earth nav data/+40-130")));
        assert!(!is_package_dir(Path::new("yOrtho4XP_Overlays/Earth nav data/+50+000")));
    }

    #[test]
    fn test_scan_queues_only_package_dsf_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf"));
        touch(&nav(root, "z_autoortho/scenery/z_ao_eur").join("+50+009.dsf"));
        touch(&nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf-pre_o4xp_2_xp12"));
        touch(&nav(root, "zOrtho4XP_+50+008").join("notes.txt"));
        touch(&nav(root, "Other Airport").join("+50+008.dsf"));

        let (report, paths) = scan(root, None).unwrap();

        assert_eq!(report.found, 2);
        assert_eq!(report.queued, 2);
        assert_eq!(
            paths,
            [
                nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf"),
                nav(root, "z_autoortho/scenery/z_ao_eur").join("+50+009.dsf"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_converted_tiles() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let dsf = nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf");
        touch(&dsf);
        touch(&nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf-o4xp_2_xp12_done"));

        let (report, paths) = scan(root, None).unwrap();

        assert_eq!(report.already_converted, 1);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_scan_rectangle_example() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf"));

        let (inside, paths) = scan(root, Some("+50+008,+51+009")).unwrap();
        assert_eq!(inside.queued, 1);
        assert_eq!(paths.len(), 1);

        let (outside, paths) = scan(root, Some("+52+010,+53+011")).unwrap();
        assert_eq!(outside.outside_rect, 1);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_malformed_name_is_fatal_under_rectangle() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&nav(root, "zOrtho4XP_+50+008").join("tile50.dsf"));

        let err = scan(root, Some("+50+008,+51+009")).unwrap_err();
        assert!(matches!(err, ScanError::InvalidTileName(_)));

        // Without a rectangle the name is never parsed.
        let (report, _) = scan(root, None).unwrap();
        assert_eq!(report.queued, 1);
    }

    #[test]
    fn test_tile_outside_earth_nav_data_is_fatal() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(
            &root
                .join("Custom Scenery")
                .join("zOrtho4XP_+50+008")
                .join("+50+008.dsf"),
        );

        let err = scan(root, None).unwrap_err();
        assert!(matches!(err, ScanError::OutsideEarthNavData(_)));
    }

    #[test]
    fn test_missing_scan_root_is_walk_error() {
        let temp = TempDir::new().unwrap();
        let err = scan(&temp.path().join("nowhere"), None).unwrap_err();
        assert!(matches!(err, ScanError::Walk { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_link_below_root_is_skipped() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let dsf = nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf");
        touch(&dsf);
        symlink(
            root.join("unmounted"),
            root.join("Custom Scenery").join("Dead Mount"),
        )
        .unwrap();

        let (report, paths) = scan(root, None).unwrap();

        assert_eq!(report.unreadable, 1);
        assert_eq!(report.queued, 1);
        assert_eq!(paths, [dsf]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_package_is_scanned() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let storage = temp.path().join("storage").join("zOrtho4XP_+50+008");
        touch(&storage.join("Earth nav data").join("+50+000").join("+50+008.dsf"));
        fs::create_dir_all(root.join("Custom Scenery")).unwrap();
        symlink(&storage, root.join("Custom Scenery").join("zOrtho4XP_+50+008")).unwrap();

        let (report, paths) = scan(root, None).unwrap();

        assert_eq!(report.queued, 1);
        assert_eq!(paths, [nav(root, "zOrtho4XP_+50+008").join("+50+008.dsf")]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_queued_iff_inside_rect_and_unconverted(
            tiles in prop::collection::btree_set((-5i16..5, -5i16..5), 1..12),
            converted in prop::collection::vec(any::<bool>(), 12),
            lat1 in -5i16..5, lon1 in -5i16..5, lat2 in -5i16..5, lon2 in -5i16..5,
        ) {
            let temp = TempDir::new().unwrap();
            let root = temp.path();
            let rect = TileRect::new(DsfTileCoord::new(lat1, lon1), DsfTileCoord::new(lat2, lon2));

            let mut expected = BTreeSet::new();
            for (i, &(lat, lon)) in tiles.iter().enumerate() {
                let coord = DsfTileCoord::new(lat, lon);
                let dsf = nav(root, "zOrtho4XP_prop").join(format!("{}.dsf", coord));
                touch(&dsf);
                if converted[i] {
                    let marker = format!("{}.dsf{}", coord, crate::tile::MARKER_SUFFIX);
                    touch(&nav(root, "zOrtho4XP_prop").join(marker));
                } else if rect.contains(coord) {
                    expected.insert(dsf);
                }
            }

            let (_, paths) = scan(root, Some(&rect.to_string())).unwrap();
            let queued: BTreeSet<PathBuf> = paths.into_iter().collect();
            prop_assert_eq!(queued, expected);
        }
    }
}
