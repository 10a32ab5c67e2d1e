//! External tool adapters.
//!
//! Everything preprint borrows from the outside world (TeX compiler,
//! `latexdiff`, ImageMagick, `git`, the CTAN `vc` hook) runs as a
//! synchronous subprocess behind a small seam, so the pipelines stay
//! testable without spawning anything.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::util::decode_text;

/// Captured result of a tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Map a spawn failure to an error: a missing binary gets its own
/// variant, anything else stays an I/O error.
pub(crate) fn spawn_error(tool: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::ToolUnavailable(tool.to_string())
    } else {
        Error::Io(err)
    }
}

// --- Compiler ---

/// Compiles a manuscript to PDF.
pub trait Compiler {
    fn compile(&self, master: &Path) -> Result<ToolOutput>;
}

/// Runs the configured command template through the shell, with
/// `{master}` replaced by the manuscript path.
pub struct ShellCompiler {
    template: String,
    dir: Option<PathBuf>,
}

impl ShellCompiler {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            dir: None,
        }
    }

    /// Run the command from `dir` instead of the current directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Render the command line for `master`.
    pub fn render(&self, master: &Path) -> String {
        self.template
            .replace("{master}", &master.display().to_string())
    }
}

impl Compiler for ShellCompiler {
    fn compile(&self, master: &Path) -> Result<ToolOutput> {
        let command_line = self.render(master);
        debug!(command = %command_line, "compiling");

        let mut command = Command::new("sh");
        command.arg("-c").arg(&command_line);
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        let output = command.output().map_err(|e| spawn_error("sh", e))?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: decode_text(&output.stdout).into_owned(),
            stderr: decode_text(&output.stderr).into_owned(),
        })
    }
}

// --- Image conversion ---

/// Converts figure files to JPEG.
pub trait ImageConverter {
    fn to_jpeg(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// ImageMagick-backed converter, shelling out to `convert`.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    /// Rasterization density in DPI for vector sources.
    pub density: u32,
    /// JPEG quality, 1 to 100.
    pub quality: u32,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self {
            density: 300,
            quality: 80,
        }
    }
}

impl ImageConverter for ImageMagick {
    fn to_jpeg(&self, source: &Path, dest: &Path) -> Result<()> {
        debug!(source = %source.display(), dest = %dest.display(), "converting to JPEG");
        let output = Command::new("convert")
            .arg("-density")
            .arg(self.density.to_string())
            .arg("-trim")
            .arg("-quality")
            .arg(self.quality.to_string())
            .arg(source)
            .arg(dest)
            .output()
            .map_err(|e| spawn_error("convert", e))?;

        if !output.status.success() {
            return Err(Error::TranscodeFailed {
                figure: source.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

// --- latexdiff ---

/// Run `latexdiff` between two flattened manuscripts and return the
/// change-marked source.
pub fn latexdiff(previous: &Path, current: &Path) -> Result<String> {
    let output = Command::new("latexdiff")
        .arg("--type=CTRADITIONAL")
        .arg(previous)
        .arg(current)
        .output()
        .map_err(|e| spawn_error("latexdiff", e))?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: "latexdiff".into(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(decode_text(&output.stdout).into_owned())
}

// --- vc hook ---

/// Run the CTAN `vc` version-control hook if the project carries one,
/// regenerating `vc.tex` with the current revision info.
///
/// Returns whether the hook was present. A failing hook is logged and
/// tolerated; the manuscript still builds without fresh version info.
pub fn run_vc_hook(dir: &Path) -> Result<bool> {
    if !dir.join("vc").is_file() {
        return Ok(false);
    }

    debug!(dir = %dir.display(), "running vc hook");
    let status = Command::new("sh")
        .arg("vc")
        .current_dir(dir)
        .status()
        .map_err(|e| spawn_error("sh", e))?;
    if !status.success() {
        warn!("vc hook exited with failure");
    }
    Ok(true)
}
