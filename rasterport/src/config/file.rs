//! Configuration file handling for `rasterport.ini`.
//!
//! Every setting is optional. Values left out of the file fall back to the
//! command line or to the built-in defaults in [`super::ConvertConfig`].
//!
//! ```ini
//! [xplane]
//! root = E:\X-Plane-12
//!
//! [tools]
//! dsftool = E:\XPL-Tools\xptools_win_23-4\tools\DSFTool
//! sevenzip = C:\Program Files\7-Zip\7z.exe
//!
//! [convert]
//! workers = 10
//! work_dir = work
//! poll_interval = 20
//! ```

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use thiserror::Error;

/// Default configuration filename, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "rasterport.ini";

/// Upper bound for the worker count accepted from the config file.
pub const MAX_WORKERS: usize = 64;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[xplane]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XPlaneSettings {
    /// X-Plane 12 install root.
    pub root: Option<PathBuf>,
}

/// `[tools]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSettings {
    /// Path to the `DSFTool` binary.
    pub dsf_tool: Option<PathBuf>,
    /// Path to the `7z` binary.
    pub seven_zip: Option<PathBuf>,
}

/// `[convert]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSettings {
    pub workers: Option<usize>,
    pub work_dir: Option<PathBuf>,
    /// Progress log interval in seconds.
    pub poll_interval: Option<u64>,
}

/// Parsed contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub xplane: XPlaneSettings,
    pub tools: ToolSettings,
    pub convert: ConvertSettings,
}

impl ConfigFile {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file_opt(path, parse_options())?;
        parse_ini(&ini)
    }

    /// Parse configuration from ini text.
    pub fn parse(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str_opt(content, parse_options())
            .map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        parse_ini(&ini)
    }
}

/// Backslashes are path separators on Windows, not escapes.
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [xplane] section
    if let Some(section) = ini.section(Some("xplane")) {
        config.xplane.root = section.get("root").and_then(non_empty_path);
    }

    // [tools] section
    if let Some(section) = ini.section(Some("tools")) {
        config.tools.dsf_tool = section.get("dsftool").and_then(non_empty_path);
        config.tools.seven_zip = section.get("sevenzip").and_then(non_empty_path);
    }

    // [convert] section
    if let Some(section) = ini.section(Some("convert")) {
        if let Some(v) = section.get("workers") {
            let workers = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=MAX_WORKERS).contains(n))
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "convert".to_string(),
                    key: "workers".to_string(),
                    value: v.to_string(),
                    reason: format!("must be an integer between 1 and {}", MAX_WORKERS),
                })?;
            config.convert.workers = Some(workers);
        }
        config.convert.work_dir = section.get("work_dir").and_then(non_empty_path);
        if let Some(v) = section.get("poll_interval") {
            let secs = v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "convert".to_string(),
                    key: "poll_interval".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (seconds)".to_string(),
                })?;
            config.convert.poll_interval = Some(secs);
        }
    }

    Ok(config)
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(expand_tilde(value))
    }
}

/// Expand a leading `~/` to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
