//! Manuscript include-tree resolution and flattening.
//!
//! A LaTeX project is a tree: the master document pulls in child files
//! with `\input` and `\InputIfFileExists`, and those children pull in
//! their own. [`ManuscriptTree::resolve`] walks that tree through a
//! [`SourceReader`] (working tree, git revision, or in-memory fixture)
//! and [`ManuscriptTree::flatten`] splices it back into one
//! self-contained document.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use regex_lite::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::io::SourceReader;
use crate::tex::{scan_includes, IncludeDirective, IncludeKind};

/// How much of a file to scan for `\documentclass` when looking for the
/// root document.
const ROOT_SCAN_BYTES: u64 = 2048;

/// One manuscript source file and the includes found in it.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    /// Path relative to the reader root.
    pub path: PathBuf,
    pub text: String,
    pub includes: Vec<IncludeEdge>,
}

/// An include directive and the document it resolved to.
#[derive(Debug, Clone)]
pub struct IncludeEdge {
    pub directive: IncludeDirective,
    /// `None` when a conditional include target does not exist.
    pub node: Option<DocumentNode>,
}

/// The include tree rooted at the master document.
#[derive(Debug, Clone)]
pub struct ManuscriptTree {
    pub root: DocumentNode,
}

impl ManuscriptTree {
    /// Build the tree rooted at `master` by recursively following
    /// include directives through `reader`.
    ///
    /// Include targets resolve relative to the directory of the file
    /// containing the directive, falling back to the reader root. A
    /// target without an extension gets `.tex` appended. A missing
    /// `\input` target or a cyclic include chain aborts resolution.
    pub fn resolve(reader: &dyn SourceReader, master: &Path) -> Result<Self> {
        if !reader.exists(master) {
            return Err(Error::MissingMasterFile(master.to_path_buf()));
        }
        let mut stack = Vec::new();
        let root = resolve_node(reader, lexical_normalize(master), &mut stack)?;
        Ok(Self { root })
    }

    /// Inline every include, producing one self-contained source.
    ///
    /// Text outside the directives is preserved byte for byte; a
    /// document with no includes flattens to exactly its own text.
    pub fn flatten(&self) -> String {
        flatten_node(&self.root)
    }

    /// Number of source files in the tree.
    pub fn file_count(&self) -> usize {
        count_nodes(&self.root)
    }
}

fn resolve_node(
    reader: &dyn SourceReader,
    path: PathBuf,
    stack: &mut Vec<PathBuf>,
) -> Result<DocumentNode> {
    if stack.contains(&path) {
        let mut chain = stack.clone();
        chain.push(path);
        return Err(Error::IncludeCycle { chain });
    }

    let text = reader.read(&path)?;
    stack.push(path.clone());

    let mut includes = Vec::new();
    for directive in scan_includes(&text) {
        let node = match resolve_target(reader, &path, &directive.target) {
            Some(target) => Some(resolve_node(reader, target, stack)?),
            None if directive.kind == IncludeKind::Conditional => {
                debug!(target = %directive.target, "conditional include skipped");
                None
            }
            None => {
                return Err(Error::MissingInclude {
                    target: PathBuf::from(target_file_name(&directive.target)),
                    within: path,
                    line: directive.line,
                });
            }
        };
        includes.push(IncludeEdge { directive, node });
    }

    stack.pop();
    Ok(DocumentNode {
        path,
        text,
        includes,
    })
}

/// Locate the file an include target refers to, or `None` if absent.
fn resolve_target(reader: &dyn SourceReader, from: &Path, target: &str) -> Option<PathBuf> {
    let file = target_file_name(target);

    let parent = from.parent().unwrap_or_else(|| Path::new(""));
    let local = lexical_normalize(&parent.join(&file));
    if reader.exists(&local) {
        return Some(local);
    }

    let rooted = lexical_normalize(Path::new(&file));
    if rooted != local && reader.exists(&rooted) {
        return Some(rooted);
    }

    None
}

/// Append `.tex` to targets written without an extension.
fn target_file_name(target: &str) -> String {
    if Path::new(target).extension().is_some() {
        target.to_string()
    } else {
        format!("{target}.tex")
    }
}

/// Resolve `.` and `..` components without touching the filesystem, so
/// the same file always compares equal on the include stack.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn flatten_node(node: &DocumentNode) -> String {
    let mut out = String::with_capacity(node.text.len());
    let mut cursor = 0;
    for edge in &node.includes {
        out.push_str(&node.text[cursor..edge.directive.span.start]);
        if let Some(child) = &edge.node {
            out.push_str(&flatten_node(child));
        }
        cursor = edge.directive.span.end;
    }
    out.push_str(&node.text[cursor..]);
    out
}

fn count_nodes(node: &DocumentNode) -> usize {
    1 + node
        .includes
        .iter()
        .filter_map(|edge| edge.node.as_ref())
        .map(count_nodes)
        .sum::<usize>()
}

/// Find the root `.tex` document under `dir`.
///
/// Walks the directory in sorted order and returns the first `.tex`
/// file whose opening bytes declare a `\documentclass`.
pub fn find_root_document(dir: &Path) -> Result<PathBuf> {
    let class = Regex::new(r"(?m)^\s*\\documentclass").unwrap();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == "tex") {
            continue;
        }
        if class.is_match(&head_of(path)?) {
            debug!(path = %path.display(), "found root document");
            return Ok(path.to_path_buf());
        }
    }

    Err(Error::MissingMasterFile(dir.to_path_buf()))
}

fn head_of(path: &Path) -> Result<String> {
    let file = fs::File::open(path)?;
    let mut head = Vec::with_capacity(ROOT_SCAN_BYTES as usize);
    file.take(ROOT_SCAN_BYTES).read_to_end(&mut head)?;
    // a 2 KiB cut can split a UTF-8 sequence; lossy decoding is fine
    // since only the ASCII \documentclass matters here
    Ok(String::from_utf8_lossy(&head).into_owned())
}
