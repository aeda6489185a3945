//! X-Plane 12 installation detection.
//!
//! X-Plane records its install locations in a reference file:
//! - Linux/macOS: `~/.x-plane/x-plane_install_12.txt`
//! - Windows: `%LOCALAPPDATA%\x-plane\x-plane_install_12.txt`
//!
//! The file holds one install path per line.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur when detecting the X-Plane root.
#[derive(Debug, Error)]
pub enum XPlanePathError {
    /// Home directory could not be determined.
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    /// X-Plane install reference file not found.
    #[error("X-Plane 12 install reference not found at {0}")]
    InstallFileNotFound(PathBuf),

    /// Failed to read the install reference file.
    #[error("Failed to read X-Plane install reference: {0}")]
    ReadError(#[from] std::io::Error),

    /// None of the listed install paths exists.
    #[error("No existing X-Plane 12 install listed in {0}")]
    InstallPathNotFound(PathBuf),
}

fn install_reference_path() -> Result<PathBuf, XPlanePathError> {
    #[cfg(target_os = "windows")]
    {
        let local_app_data =
            std::env::var("LOCALAPPDATA").map_err(|_| XPlanePathError::NoHomeDirectory)?;
        Ok(PathBuf::from(local_app_data)
            .join("x-plane")
            .join("x-plane_install_12.txt"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().ok_or(XPlanePathError::NoHomeDirectory)?;
        Ok(home.join(".x-plane").join("x-plane_install_12.txt"))
    }
}

/// Detect the X-Plane 12 installation directory.
pub fn detect_xplane_root() -> Result<PathBuf, XPlanePathError> {
    read_install_reference(&install_reference_path()?)
}

/// Return the first existing install listed in a reference file.
pub fn read_install_reference(reference: &Path) -> Result<PathBuf, XPlanePathError> {
    if !reference.exists() {
        return Err(XPlanePathError::InstallFileNotFound(reference.to_path_buf()));
    }

    let contents = fs::read_to_string(reference)?;
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .find(|path| path.is_dir())
        .ok_or_else(|| XPlanePathError::InstallPathNotFound(reference.to_path_buf()))
}
