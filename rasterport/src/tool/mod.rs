//! External tool adapter.
//!
//! The conversion relies on two external programs:
//! - `DSFTool` from the X-Plane scenery tools, to decompile DSF tiles to text
//!   and compile text back to DSF
//! - `7z`, to repack the compiled tile the way X-Plane ships them
//!
//! Commands are described by [`ToolCommand`] and executed by a
//! [`ToolRunner`]. [`ProcessRunner`] runs them as child processes; tests
//! substitute their own runner.

mod command;
mod runner;

pub use command::{DsfTool, SevenZip, ToolCommand};
pub use runner::{ProcessRunner, ToolOutput, ToolRunner};

use thiserror::Error;

/// Result type for tool invocations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised while running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started (missing binary, permissions).
    #[error("failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("{command} exited with {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}
