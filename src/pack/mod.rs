//! Manuscript packaging pipeline.
//!
//! [`run`] turns a working LaTeX project into a flat, self-contained
//! bundle under `build/<name>/`, ready for journal or arXiv upload. The
//! pipeline moves through fixed stages:
//!
//! 1. init: clear and recreate the output directory
//! 2. resolve: walk the include tree from the master document
//! 3. inline: flatten includes and strip comments
//! 4. figure rewriting: select figure files, fix their final
//!    (journal-style) names, and rewrite references
//! 5. bibliography: copy or splice the compiled `.bbl`
//! 6. transcode: copy figures in under their final names, converting
//!    oversized ones to JPEG
//! 7. write: emit the normalized manuscript
//!
//! A failure at any stage aborts the run, removes the partial output
//! directory, and reports the stage it happened in.

mod install;
mod plan;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::config::DEFAULT_EXTENSIONS;
use crate::error::{Error, Result};
use crate::figures::FigureResolver;
use crate::io::FsReader;
use crate::manuscript::ManuscriptTree;
use crate::tex;
use crate::tool::ImageConverter;

use install::{handle_bibliography, install};
use plan::FigurePlan;

/// Default figure size cap, two decimal megabytes.
pub const DEFAULT_MAX_FIGURE_BYTES: u64 = 2_000_000;

/// Output conventions for a pack run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackStyle {
    /// Journal submission: figures renamed `f1`, `f2`, ... on disk and
    /// in the manuscript, `.bbl` copied alongside, no size cap.
    Aastex,
    /// arXiv upload: figure names kept, `.bbl` spliced into the
    /// manuscript, figures above the size cap converted to JPEG.
    Arxiv,
}

impl PackStyle {
    /// Whether figures get sequential journal names on disk.
    pub fn renames_figures(self) -> bool {
        matches!(self, PackStyle::Aastex)
    }

    /// Whether the figure size cap applies.
    pub fn enforces_size_cap(self) -> bool {
        matches!(self, PackStyle::Arxiv)
    }
}

impl fmt::Display for PackStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStyle::Aastex => write!(f, "aastex"),
            PackStyle::Arxiv => write!(f, "arxiv"),
        }
    }
}

impl FromStr for PackStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "aastex" => Ok(PackStyle::Aastex),
            "arxiv" => Ok(PackStyle::Arxiv),
            other => Err(format!("unknown style '{other}' (expected aastex or arxiv)")),
        }
    }
}

/// Pipeline stages, used to label progress and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Resolve,
    Inline,
    RewriteFigures,
    Bibliography,
    Transcode,
    Write,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Resolve => "resolve",
            Stage::Inline => "inline",
            Stage::RewriteFigures => "figure rewriting",
            Stage::Bibliography => "bibliography",
            Stage::Transcode => "transcode",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for a single pack run.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Bundle name; output lands in `<build_root>/<name>/`.
    pub name: String,
    pub style: PackStyle,
    /// Figure extension priority, highest first.
    pub extensions: Vec<String>,
    /// Size cap in bytes, applied when the style enforces one.
    pub max_figure_bytes: u64,
    /// Master document path.
    pub master: PathBuf,
    /// Directory receiving build outputs.
    pub build_root: PathBuf,
}

impl PackOptions {
    /// Options with defaults: aastex style, standard extension
    /// priority, a name derived from the master document's stem, and
    /// `build/` as the output root.
    pub fn new(master: impl Into<PathBuf>) -> Self {
        let master = master.into();
        let name = master
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manuscript".to_string());
        Self {
            name,
            style: PackStyle::Aastex,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_figure_bytes: DEFAULT_MAX_FIGURE_BYTES,
            master,
            build_root: PathBuf::from("build"),
        }
    }

    /// The effective size cap, `None` when the style has none.
    pub fn size_cap(&self) -> Option<u64> {
        self.style
            .enforces_size_cap()
            .then_some(self.max_figure_bytes)
    }
}

/// What kind of file a build artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Figure,
    TranscodedFigure,
    Bibliography,
    Manuscript,
}

/// One file placed in the output directory.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    /// Where the content came from; `None` for generated files.
    pub source: Option<PathBuf>,
    /// File name within the output directory.
    pub dest: PathBuf,
    pub size: u64,
    pub kind: ArtifactKind,
}

/// Summary of a completed pack run.
#[derive(Debug)]
pub struct PackReport {
    pub output_dir: PathBuf,
    pub manuscript: PathBuf,
    pub artifacts: Vec<BuildArtifact>,
}

impl PackReport {
    /// Number of figure files in the bundle.
    pub fn figure_count(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|a| {
                matches!(
                    a.kind,
                    ArtifactKind::Figure | ArtifactKind::TranscodedFigure
                )
            })
            .count()
    }
}

/// Freshly created output directory, removed again on drop unless the
/// run commits it.
struct OutputDir {
    path: PathBuf,
    committed: bool,
}

impl OutputDir {
    /// Clear any previous bundle at `path` and create it anew.
    fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            fs::remove_dir_all(path)?;
        }
        fs::create_dir_all(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            committed: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory; called once the bundle is complete.
    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

fn stage_error(stage: Stage, source: Error) -> Error {
    match source {
        wrapped @ Error::Stage { .. } => wrapped,
        source => Error::Stage {
            stage: stage.name(),
            source: Box::new(source),
        },
    }
}

fn wrap<T>(stage: Stage, result: Result<T>) -> Result<T> {
    result.map_err(|source| stage_error(stage, source))
}

/// Directory containing `master`, usable as a process working directory.
pub fn project_dir(master: &Path) -> PathBuf {
    match master.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Run the packaging pipeline.
///
/// On success the bundle is left in
/// `options.build_root/options.name/` and described by the returned
/// report. On failure the partial bundle is removed and the error names
/// the stage that failed.
pub fn run(options: &PackOptions, converter: &dyn ImageConverter) -> Result<PackReport> {
    info!(name = %options.name, style = %options.style, "packing manuscript");

    let master = options.master.as_path();
    if !master.is_file() {
        return Err(stage_error(
            Stage::Init,
            Error::MissingMasterFile(master.to_path_buf()),
        ));
    }
    let project = project_dir(master);
    let master_name = master.file_name().map(Path::new).unwrap_or(master);
    let out_path = options.build_root.join(&options.name);
    let mut outdir = wrap(Stage::Init, OutputDir::create(&out_path))?;

    let reader = FsReader::new(&project);
    let tree = wrap(Stage::Resolve, ManuscriptTree::resolve(&reader, master_name))?;
    debug!(files = tree.file_count(), "resolved include tree");

    let mut text = tree.flatten();
    text = tex::strip_comments(&text);

    let resolver = FigureResolver::new(vec![project.clone()], options.extensions.clone());
    let commands = tex::scan_figures(&text);
    let plan = wrap(
        Stage::RewriteFigures,
        FigurePlan::build(&commands, &resolver, options.style, options.size_cap()),
    )?;
    debug!(figures = plan.figures.len(), "planned figure installs");
    text = tex::rewrite_spans(&text, &plan.rewrites);

    let bbl = master.with_extension("bbl");
    let bib_artifact = wrap(
        Stage::Bibliography,
        handle_bibliography(&mut text, options.style, &bbl, outdir.path()),
    )?;

    let mut artifacts = Vec::with_capacity(plan.figures.len() + 2);
    for figure in &plan.figures {
        let artifact = wrap(
            Stage::Transcode,
            install(figure, outdir.path(), options.size_cap(), converter),
        )?;
        artifacts.push(artifact);
    }

    let text = tex::collapse_blank_lines(&text);
    let manuscript_path = outdir.path().join(master_name);
    wrap(
        Stage::Write,
        fs::write(&manuscript_path, &text).map_err(Error::from),
    )?;
    artifacts.push(BuildArtifact {
        source: None,
        dest: master_name.to_path_buf(),
        size: text.len() as u64,
        kind: ArtifactKind::Manuscript,
    });
    if let Some(artifact) = bib_artifact {
        artifacts.push(artifact);
    }

    outdir.commit();
    info!(
        dir = %out_path.display(),
        files = artifacts.len(),
        "pack complete"
    );

    Ok(PackReport {
        output_dir: out_path,
        manuscript: manuscript_path,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_style_round_trips_through_strings() {
        for style in [PackStyle::Aastex, PackStyle::Arxiv] {
            assert_eq!(style.to_string().parse::<PackStyle>().unwrap(), style);
        }
        assert!("apj".parse::<PackStyle>().is_err());
    }

    #[test]
    fn test_options_derive_name_from_master() {
        let options = PackOptions::new("papers/cluster.tex");
        assert_eq!(options.name, "cluster");
        assert_eq!(options.style, PackStyle::Aastex);
        assert_eq!(options.size_cap(), None);
    }

    #[test]
    fn test_size_cap_only_for_arxiv() {
        let mut options = PackOptions::new("ms.tex");
        options.style = PackStyle::Arxiv;
        options.max_figure_bytes = 500;
        assert_eq!(options.size_cap(), Some(500));
    }

    #[test]
    fn test_output_dir_removed_unless_committed() {
        let root = TempDir::new().expect("tempdir");
        let target = root.path().join("bundle");

        {
            let _outdir = OutputDir::create(&target).unwrap();
            assert!(target.is_dir());
        }
        assert!(!target.exists());

        {
            let mut outdir = OutputDir::create(&target).unwrap();
            outdir.commit();
        }
        assert!(target.is_dir());
    }

    #[test]
    fn test_output_dir_clears_previous_bundle() {
        let root = TempDir::new().expect("tempdir");
        let target = root.path().join("bundle");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.tex"), "old").unwrap();

        let mut outdir = OutputDir::create(&target).unwrap();
        outdir.commit();
        assert!(!target.join("stale.tex").exists());
    }

    #[test]
    fn test_stage_errors_are_not_double_wrapped() {
        let inner = stage_error(Stage::Resolve, Error::MissingMasterFile("ms.tex".into()));
        let outer = stage_error(Stage::Write, inner);
        match outer {
            Error::Stage { stage, .. } => assert_eq!(stage, "resolve"),
            other => panic!("expected Stage, got {other}"),
        }
    }

    #[test]
    fn test_project_dir_of_bare_file_is_cwd() {
        assert_eq!(project_dir(Path::new("ms.tex")), PathBuf::from("."));
        assert_eq!(
            project_dir(Path::new("paper/ms.tex")),
            PathBuf::from("paper")
        );
    }
}
