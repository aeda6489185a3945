//! Command-line arguments.
//!
//! `-root` and `-rect` are accepted with a single dash, as well as the usual
//! `--root` and `--rect`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use rasterport::config::{DEFAULT_CONFIG_FILE, MAX_WORKERS};
use rasterport::coord::TileRect;

/// Single-dash long flags rewritten before parsing.
const SINGLE_DASH_FLAGS: &[&str] = &["root", "rect"];

#[derive(Debug, Parser)]
#[command(name = "rasterport", version)]
#[command(
    about = "Add X-Plane 12 season, sound and elevation rasters to Ortho4XP and AutoOrtho tiles",
    long_about = None
)]
pub struct Args {
    /// X-Plane 12 install root (default: config file, then detected install)
    #[arg(long, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Only convert tiles inside this rectangle, e.g. +50+008,+51+009
    #[arg(long, value_name = "RECT", allow_hyphen_values = true, value_parser = parse_rect)]
    pub rect: Option<TileRect>,

    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Number of concurrent workers
    #[arg(long, value_name = "N", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Directory for raster caches and intermediate text files
    #[arg(long, value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// List the tiles that would be converted, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Rewrite `-root`/`-rect` (and their `=value` forms) to double-dash flags.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            for flag in SINGLE_DASH_FLAGS {
                let Some(rest) = text.strip_prefix('-').and_then(|t| t.strip_prefix(flag)) else {
                    continue;
                };
                if rest.is_empty() || rest.starts_with('=') {
                    return OsString::from(format!("-{}", text));
                }
            }
            arg
        })
        .collect()
}

fn parse_rect(value: &str) -> Result<TileRect, String> {
    value.parse().map_err(|e| format!("{}", e))
}

fn parse_workers(value: &str) -> Result<usize, String> {
    value
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=MAX_WORKERS).contains(n))
        .ok_or_else(|| format!("must be an integer between 1 and {}", MAX_WORKERS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use rasterport::coord::DsfTileCoord;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let argv = std::iter::once("rasterport")
            .chain(args.iter().copied())
            .map(OsString::from);
        Args::try_parse_from(normalize_args(argv))
    }

    #[test]
    fn test_normalize_single_dash_flags() {
        let argv = ["rasterport", "-root", "/xp", "-rect=+50+008,+51+009", "-rooted", "--dry-run"]
            .iter()
            .map(OsString::from);
        assert_eq!(
            normalize_args(argv),
            ["rasterport", "--root", "/xp", "--rect=+50+008,+51+009", "-rooted", "--dry-run"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert!(args.root.is_none());
        assert!(args.rect.is_none());
        assert_eq!(args.config, PathBuf::from("rasterport.ini"));
        assert!(args.workers.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_single_dash_root_and_rect() {
        let args = parse(&["-root", "E:/X-Plane 12", "-rect", "+50+008,+51+009"]).unwrap();
        assert_eq!(args.root, Some(PathBuf::from("E:/X-Plane 12")));
        assert_eq!(
            args.rect,
            Some(TileRect::new(DsfTileCoord::new(50, 8), DsfTileCoord::new(51, 9)))
        );
    }

    #[test]
    fn test_rect_starting_with_minus() {
        let args = parse(&["--rect", "-34-071,-33-070"]).unwrap();
        let rect = args.rect.unwrap();
        assert!(rect.contains(DsfTileCoord::new(-34, -71)));
        assert!(rect.contains(DsfTileCoord::new(-33, -70)));
    }

    #[test]
    fn test_malformed_rect_is_error() {
        let err = parse(&["-rect", "50,8"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_missing_value_is_error() {
        assert!(parse(&["-root"]).is_err());
        assert!(parse(&["-rect"]).is_err());
    }

    #[test]
    fn test_workers_range() {
        assert_eq!(parse(&["--workers", "4"]).unwrap().workers, Some(4));
        assert!(parse(&["--workers", "0"]).is_err());
        assert!(parse(&["--workers", "65"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }
}
