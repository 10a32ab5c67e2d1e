use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::tool::spawn_error;
use crate::util::decode_text;

/// A provider of manuscript text, addressed by paths relative to the
/// manuscript root.
///
/// The include resolver only ever asks two questions: does a file exist,
/// and what does it contain. Keeping the answers behind a trait lets the
/// same resolution code run against the working tree, a git revision, or
/// an in-memory fixture.
pub trait SourceReader {
    /// Read the decoded text of the file at `path`.
    fn read(&self, path: &Path) -> Result<String>;

    /// Returns true if `path` exists in this source.
    fn exists(&self, path: &Path) -> bool;
}

// --- Implementation: Working tree ---

/// Reads manuscript files from a directory on disk.
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(self.full_path(path))?;
        Ok(decode_text(&bytes).into_owned())
    }

    fn exists(&self, path: &Path) -> bool {
        self.full_path(path).is_file()
    }
}

// --- Implementation: Git revision ---

/// Reads manuscript files as they were at a given git revision, via
/// `git show` and `git cat-file`.
pub struct GitReader {
    repo_root: PathBuf,
    /// Prefix of reader paths relative to the repository root.
    prefix: PathBuf,
    reference: String,
}

impl GitReader {
    /// Locate the repository containing `dir` and read files under `dir`
    /// as of `reference` (a commit hash, tag, or ref like `HEAD~2`).
    pub fn discover(dir: impl Into<PathBuf>, reference: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        let output = Command::new("git")
            .arg("-C")
            .arg(&dir)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .map_err(|e| spawn_error("git", e))?;
        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: "git".into(),
                detail: format!("{} is not inside a git repository", dir.display()),
            });
        }
        let repo_root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        let prefix = dir
            .canonicalize()?
            .strip_prefix(&repo_root)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        debug!(root = %repo_root.display(), "discovered git repository");
        Ok(Self {
            repo_root,
            prefix,
            reference: reference.into(),
        })
    }

    /// The `REF:path` spec addressing `path` inside the repository.
    fn object_spec(&self, path: &Path) -> String {
        // git object paths always use forward slashes
        let parts: Vec<String> = self
            .prefix
            .join(path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("{}:{}", self.reference, parts.join("/"))
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_root);
        cmd
    }
}

impl SourceReader for GitReader {
    fn read(&self, path: &Path) -> Result<String> {
        let spec = self.object_spec(path);
        let output = self
            .git()
            .args(["show", &spec])
            .output()
            .map_err(|e| spawn_error("git", e))?;
        if !output.status.success() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no blob {spec}"),
            )));
        }
        Ok(decode_text(&output.stdout).into_owned())
    }

    fn exists(&self, path: &Path) -> bool {
        let spec = self.object_spec(path);
        self.git()
            .args(["cat-file", "-e", &spec])
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

// --- Implementation: In-memory ---

/// Holds manuscript text in memory; used by tests.
#[derive(Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content at the same path.
    pub fn insert(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no file {}", path.display()),
            ))
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_memory_reader_read_and_exists() {
        let reader = MemoryReader::new().insert("a.tex", "\\input{b}");
        assert!(reader.exists(Path::new("a.tex")));
        assert!(!reader.exists(Path::new("b.tex")));
        assert_eq!(reader.read(Path::new("a.tex")).unwrap(), "\\input{b}");
    }

    #[test]
    fn test_memory_reader_missing_file_errors() {
        let reader = MemoryReader::new();
        assert!(reader.read(Path::new("gone.tex")).is_err());
    }

    #[test]
    fn test_fs_reader_reads_relative_to_root() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join("sections")).unwrap();
        fs::write(dir.path().join("sections/intro.tex"), "Hello").unwrap();

        let reader = FsReader::new(dir.path());
        assert!(reader.exists(Path::new("sections/intro.tex")));
        assert!(!reader.exists(Path::new("sections")));
        assert_eq!(
            reader.read(Path::new("sections/intro.tex")).unwrap(),
            "Hello"
        );
    }

    #[test]
    fn test_fs_reader_decodes_latin1() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("note.tex"), b"na\xEFve").unwrap();

        let reader = FsReader::new(dir.path());
        assert_eq!(reader.read(Path::new("note.tex")).unwrap(), "naïve");
    }
}
