//! CLI error handling.
//!
//! Every fatal error ends the run with exit status 1 after being written to
//! the log.

use std::fmt;
use std::io;
use std::path::PathBuf;

use rasterport::config::{ConfigFileError, XPlanePathError};
use rasterport::discovery::ScanError;
use rasterport::pool::PoolError;
use tracing::error;

/// Fatal CLI errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Invalid command-line arguments
    Args(clap::Error),
    /// Configuration file could not be read
    Config(ConfigFileError),
    /// No X-Plane root given and none could be detected
    XPlaneRoot(XPlanePathError),
    /// Work directory could not be created
    WorkDir { path: PathBuf, error: io::Error },
    /// Tile discovery failed
    Scan(ScanError),
    /// Worker pool could not start
    Pool(PoolError),
}

impl CliError {
    /// Write the error to the log, with a hint where one helps.
    pub fn report(&self) {
        error!("{}", self);

        match self {
            CliError::XPlaneRoot(_) => {
                error!("Pass the install directory with -root, or set root in the [xplane] section of the config file");
            }
            CliError::Scan(ScanError::InvalidTileName(_)) => {
                error!("Tile names must look like +50+008.dsf when -rect is used");
            }
            _ => {}
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Args(e) => write!(f, "Invalid arguments: {}", e.to_string().trim_end()),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::XPlaneRoot(e) => write!(f, "X-Plane 12 install not found: {}", e),
            CliError::WorkDir { path, error } => {
                write!(f, "Failed to create work directory '{}': {}", path.display(), error)
            }
            CliError::Scan(e) => write!(f, "Tile discovery failed: {}", e),
            CliError::Pool(e) => write!(f, "Conversion failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Args(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::XPlaneRoot(e) => Some(e),
            CliError::WorkDir { error, .. } => Some(error),
            CliError::Scan(e) => Some(e),
            CliError::Pool(e) => Some(e),
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ScanError> for CliError {
    fn from(e: ScanError) -> Self {
        CliError::Scan(e)
    }
}

impl From<PoolError> for CliError {
    fn from(e: PoolError) -> Self {
        CliError::Pool(e)
    }
}
