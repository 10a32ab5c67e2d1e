//! Figure file resolution by extension priority.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// A figure file selected for packaging.
#[derive(Debug, Clone)]
pub struct ResolvedFigure {
    /// Extension-less base name, directory part dropped.
    pub base: String,
    /// Extension the figure resolved to.
    pub ext: String,
    /// Path of the selected file.
    pub path: PathBuf,
    /// Size of the selected file in bytes.
    pub size: u64,
}

/// Resolves figure names written in the manuscript to files on disk
/// using an ordered extension priority list.
///
/// The order is policy, not preference: a `pdf` listed before `eps`
/// means a PDF is always taken when both exist, whatever extension the
/// manuscript mentions. The extension written in the source text (if
/// any) does not constrain the search.
#[derive(Debug, Clone)]
pub struct FigureResolver {
    search_dirs: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl FigureResolver {
    pub fn new(search_dirs: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            search_dirs,
            extensions,
        }
    }

    /// Resolve `name` (possibly carrying a directory prefix or an
    /// extension) to the first existing file, trying every extension in
    /// priority order across the search directories.
    pub fn resolve(&self, name: &str) -> Result<ResolvedFigure> {
        let written = Path::new(name);
        let base = written
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let subdir = written.parent().unwrap_or_else(|| Path::new(""));

        for ext in &self.extensions {
            for dir in &self.search_dirs {
                let candidate = dir.join(subdir).join(format!("{base}.{ext}"));
                let Ok(meta) = fs::metadata(&candidate) else {
                    continue;
                };
                if meta.is_file() {
                    debug!(figure = name, path = %candidate.display(), "resolved figure");
                    return Ok(ResolvedFigure {
                        base: base.clone(),
                        ext: ext.clone(),
                        path: candidate,
                        size: meta.len(),
                    });
                }
            }
        }

        Err(Error::MissingFigure {
            name: name.to_string(),
            attempted: self.extensions.clone(),
        })
    }
}
