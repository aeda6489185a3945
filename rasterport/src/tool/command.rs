//! Command lines for the external tools.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// A program together with its argument list.
///
/// Arguments are kept separate rather than joined into a shell string, so
/// paths with spaces (`Custom Scenery`, `Earth nav data`) need no quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Create a command for the given program with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// The executable to run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments passed to the executable.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.starts_with('-') && !arg.contains(' ') {
                write!(f, " {}", arg)?;
            } else {
                write!(f, " \"{}\"", arg)?;
            }
        }
        Ok(())
    }
}

/// Builder for `DSFTool` invocations.
#[derive(Debug, Clone)]
pub struct DsfTool {
    binary: PathBuf,
}

impl DsfTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// `DSFTool -dsf2text <dsf> <text>`
    pub fn dsf2text(&self, dsf: &Path, text: &Path) -> ToolCommand {
        ToolCommand::new(&self.binary)
            .arg("-dsf2text")
            .arg(dsf)
            .arg(text)
    }

    /// `DSFTool -text2dsf <text> <dsf>`
    pub fn text2dsf(&self, text: &Path, dsf: &Path) -> ToolCommand {
        ToolCommand::new(&self.binary)
            .arg("-text2dsf")
            .arg(text)
            .arg(dsf)
    }
}

/// Builder for 7-Zip invocations.
#[derive(Debug, Clone)]
pub struct SevenZip {
    binary: PathBuf,
}

impl SevenZip {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// `7z a -t7z -m0=lzma <archive> <input>`
    ///
    /// X-Plane reads DSF tiles stored as LZMA-compressed 7z archives.
    pub fn compress_lzma(&self, archive: &Path, input: &Path) -> ToolCommand {
        ToolCommand::new(&self.binary)
            .arg("a")
            .arg("-t7z")
            .arg("-m0=lzma")
            .arg(archive)
            .arg(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsf2text_arguments() {
        let cmd = DsfTool::new("/opt/xptools/DSFTool")
            .dsf2text(Path::new("/x/+50+008.dsf"), Path::new("work/+50+008.txt-xp12"));

        assert_eq!(cmd.program(), Path::new("/opt/xptools/DSFTool"));
        let args: Vec<_> = cmd.args().iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(args, ["-dsf2text", "/x/+50+008.dsf", "work/+50+008.txt-xp12"]);
    }

    #[test]
    fn test_text2dsf_arguments() {
        let cmd = DsfTool::new("DSFTool").text2dsf(Path::new("in.txt"), Path::new("out.dsf"));
        let args: Vec<_> = cmd.args().iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(args, ["-text2dsf", "in.txt", "out.dsf"]);
    }

    #[test]
    fn test_compress_lzma_arguments() {
        let cmd = SevenZip::new("7z").compress_lzma(Path::new("t-new"), Path::new("t-new-1"));
        let args: Vec<_> = cmd.args().iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(args, ["a", "-t7z", "-m0=lzma", "t-new", "t-new-1"]);
    }

    #[test]
    fn test_display_quotes_paths() {
        let cmd = DsfTool::new("DSFTool").dsf2text(
            Path::new("Custom Scenery/Earth nav data/+50+008.dsf"),
            Path::new("out.txt"),
        );
        assert_eq!(
            cmd.to_string(),
            "\"DSFTool\" -dsf2text \"Custom Scenery/Earth nav data/+50+008.dsf\" \"out.txt\""
        );
    }
}
