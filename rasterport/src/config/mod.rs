//! Configuration for a conversion run.
//!
//! - [`ConfigFile`]: optional `rasterport.ini` read at startup
//! - [`ConvertConfig`]: the resolved, immutable settings for one run
//! - [`detect_xplane_root`]: fallback lookup of the X-Plane 12 install

mod convert;
mod file;
mod xplane;

pub use convert::{
    ConvertConfig, DEFAULT_DEQUEUE_WAIT, DEFAULT_DSF_TOOL, DEFAULT_POLL_INTERVAL,
    DEFAULT_SEVEN_ZIP, DEFAULT_WORKERS, DEFAULT_WORK_DIR,
};
pub use file::{
    ConfigFile, ConfigFileError, ConvertSettings, ToolSettings, XPlaneSettings,
    DEFAULT_CONFIG_FILE, MAX_WORKERS,
};
pub use xplane::{detect_xplane_root, read_install_reference, XPlanePathError};
