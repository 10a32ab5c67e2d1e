//! Diff-highlighted revision builds.
//!
//! Flattens the working-tree manuscript and the manuscript as of an
//! earlier git revision, runs `latexdiff` between the two, compiles the
//! marked-up result, and leaves the PDF in the build directory. Only
//! plumbing lives here; git is read through [`GitReader`] and the
//! compiler through [`ShellCompiler`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::{FsReader, GitReader, SourceReader};
use crate::manuscript::ManuscriptTree;
use crate::pack::project_dir;
use crate::tex;
use crate::tool::{self, Compiler, ShellCompiler};

/// Extensions of compiler droppings cleaned up after the build.
const SCRATCH_EXTENSIONS: &[&str] = &["aux", "bbl", "blg", "fdb_latexmk", "fls", "log", "out"];

/// Options for a diff build.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Master document path.
    pub master: PathBuf,
    /// Revision to compare the working tree against.
    pub since: String,
    /// Name of the difference document; derived from the revision when
    /// absent.
    pub name: Option<String>,
    /// Compile command template with a `{master}` placeholder.
    pub compile_template: String,
    /// Directory receiving the final PDF.
    pub build_root: PathBuf,
}

impl DiffOptions {
    pub fn new(master: impl Into<PathBuf>, since: impl Into<String>) -> Self {
        Self {
            master: master.into(),
            since: since.into(),
            name: None,
            compile_template: crate::config::DEFAULT_COMMAND.to_string(),
            build_root: PathBuf::from("build"),
        }
    }

    /// The difference document name, e.g. `diff-HEAD-2` for `HEAD~2`.
    pub fn document_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("diff-{}", sanitize_ref(&self.since)))
    }
}

/// Build the diff-highlighted PDF. Returns its final path.
pub fn run(options: &DiffOptions) -> Result<PathBuf> {
    let master = options.master.as_path();
    if !master.is_file() {
        return Err(Error::MissingMasterFile(master.to_path_buf()));
    }
    let project = project_dir(master);
    let master_name = master.file_name().map(Path::new).unwrap_or(master);
    let name = options.document_name();
    info!(since = %options.since, name = %name, "building diff document");

    let mut scratch = Vec::new();
    let result = build(options, &project, master_name, &name, &mut scratch);
    for file in scratch {
        let _ = fs::remove_file(file);
    }
    result
}

fn build(
    options: &DiffOptions,
    project: &Path,
    master_name: &Path,
    name: &str,
    scratch: &mut Vec<PathBuf>,
) -> Result<PathBuf> {
    let current = project.join("_current.tex");
    let previous = project.join("_previous.tex");
    let marked = project.join(format!("{name}.tex"));
    scratch.push(current.clone());
    scratch.push(previous.clone());
    scratch.push(marked.clone());
    for ext in SCRATCH_EXTENSIONS {
        scratch.push(project.join(format!("{name}.{ext}")));
    }

    let working = FsReader::new(project);
    fs::write(&current, flatten(&working, master_name)?)?;

    let committed = GitReader::discover(project, options.since.as_str())?;
    fs::write(&previous, flatten(&committed, master_name)?)?;

    let markup = tool::latexdiff(&previous, &current)?;
    fs::write(&marked, markup)?;
    debug!(document = %marked.display(), "wrote change-marked source");

    let compiler = ShellCompiler::new(options.compile_template.as_str()).in_dir(project);
    let output = compiler.compile(Path::new(&format!("{name}.tex")))?;
    if !output.success {
        return Err(Error::ToolFailed {
            tool: "compile".to_string(),
            detail: tail_of(&output.stdout),
        });
    }

    let pdf = project.join(format!("{name}.pdf"));
    if !pdf.is_file() {
        return Err(Error::ToolFailed {
            tool: "compile".to_string(),
            detail: format!("no {name}.pdf produced"),
        });
    }

    fs::create_dir_all(&options.build_root)?;
    let published = options.build_root.join(format!("{name}.pdf"));
    fs::rename(&pdf, &published)?;
    info!(pdf = %published.display(), "diff build complete");
    Ok(published)
}

/// Inline the whole manuscript as seen by `reader` and strip comments,
/// giving latexdiff one self-contained file per side.
fn flatten(reader: &dyn SourceReader, master_name: &Path) -> Result<String> {
    let tree = ManuscriptTree::resolve(reader, master_name)?;
    Ok(tex::strip_comments(&tree.flatten()))
}

/// Make a git ref usable as a file name.
fn sanitize_ref(reference: &str) -> String {
    reference
        .chars()
        .map(|c| match c {
            '/' | '~' | '^' | ':' | ' ' => '-',
            other => other,
        })
        .collect()
}

fn tail_of(output: &str) -> String {
    let lines: Vec<&str> = output.lines().rev().take(15).collect();
    lines.into_iter().rev().collect::<Vec<_>>().join("\n")
}
