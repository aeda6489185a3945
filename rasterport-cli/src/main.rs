//! rasterport CLI
//!
//! Scans `Custom Scenery` for Ortho4XP and AutoOrtho tiles and splices the
//! X-Plane 12 raster layers into each of them.

mod args;
mod error;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use rasterport::config::{detect_xplane_root, ConfigFile, ConvertConfig, XPlanePathError};
use rasterport::discovery::TileScanner;
use rasterport::logging::{init_logging, DEFAULT_LOG_FILE};
use rasterport::pool::{ConversionPool, PoolConfig, WorkQueue};
use rasterport::tile::DsfConverter;
use tracing::{info, warn};

use crate::args::{normalize_args, Args};
use crate::error::CliError;

fn main() -> ExitCode {
    let _guard = match init_logging(Path::new("."), DEFAULT_LOG_FILE) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", CliError::LoggingInit(e));
            return ExitCode::FAILURE;
        }
    };

    let argv = normalize_args(env::args_os());
    info!("Arguments: {:?}", argv);

    let args = match Args::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            CliError::Args(e).report();
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let file = ConfigFile::load_from(&args.config)?;
    let config = Arc::new(build_config(&args, &file, detect_xplane_root)?);

    info!(
        root = %config.xplane_root().display(),
        work_dir = %config.work_dir().display(),
        workers = config.workers(),
        "Configuration"
    );

    fs::create_dir_all(config.work_dir()).map_err(|error| CliError::WorkDir {
        path: config.work_dir().to_path_buf(),
        error,
    })?;

    let queue = Arc::new(WorkQueue::new());
    let report = TileScanner::new(&config).scan(&queue)?;

    if args.dry_run {
        info!(tiles = report.queued, "Dry run, nothing converted");
        return Ok(());
    }

    let pool = ConversionPool::new(
        Arc::clone(&queue),
        DsfConverter::new(Arc::clone(&config)),
        PoolConfig::from(config.as_ref()),
    );
    let summary = pool.convert(config.workers())?;

    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            "Some tiles were not converted, run again to retry them"
        );
    }
    Ok(())
}

/// Resolve the run configuration: command line, then config file, then
/// defaults.
fn build_config<D>(args: &Args, file: &ConfigFile, detect: D) -> Result<ConvertConfig, CliError>
where
    D: FnOnce() -> Result<PathBuf, XPlanePathError>,
{
    let root = match args.root.clone().or_else(|| file.xplane.root.clone()) {
        Some(root) => root,
        None => detect().map_err(CliError::XPlaneRoot)?,
    };

    let mut config = ConvertConfig::from_config_file(root, file).with_rect(args.rect);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(work_dir) = &args.work_dir {
        config = config.with_work_dir(work_dir);
    }
    Ok(config)
}
