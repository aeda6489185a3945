//! Running tool commands.

use std::process::Command;

use tracing::{debug, error};

use super::{ToolCommand, ToolError, ToolResult};

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes tool commands.
///
/// Implementations block until the tool has finished. A failed run is never
/// retried here; the caller decides what a failure means.
pub trait ToolRunner: Send + Sync {
    fn run(&self, command: &ToolCommand) -> ToolResult<ToolOutput>;
}

/// Runs tools as child processes and captures their output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> ToolResult<ToolOutput> {
        debug!(command = %command, "Running tool");

        let output = Command::new(command.program())
            .args(command.args())
            .output()
            .map_err(|e| {
                error!(command = %command, error = %e, "Can't launch tool");
                ToolError::Launch {
                    command: command.to_string(),
                    source: e,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            error!(
                command = %command,
                status = ?output.status.code(),
                stdout = %stdout.trim(),
                stderr = %stderr.trim(),
                "Can't run tool"
            );
            return Err(ToolError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}
