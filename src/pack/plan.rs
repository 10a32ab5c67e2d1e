//! Figure installation planning.
//!
//! Renaming happens in two places that must agree: the manuscript text
//! (rewritten before anything is copied) and the files on disk
//! (installed and renamed later). The plan fixes every final name up
//! front so both sides work from the same answer.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::Result;
use crate::figures::{FigureResolver, ResolvedFigure};
use crate::tex::FigureCommand;

use super::PackStyle;

/// One distinct figure and the names it will carry in the bundle.
#[derive(Debug, Clone)]
pub(crate) struct PlannedFigure {
    pub resolved: ResolvedFigure,
    /// 1-based number in order of first appearance.
    pub number: usize,
    /// Name the manuscript will reference, without extension.
    pub final_stem: String,
    /// Extension the installed file will carry.
    pub final_ext: String,
    /// Whether the file exceeds the size cap and gets converted to JPEG.
    pub transcode: bool,
}

/// Everything the later stages need: distinct figures in first-seen
/// order, plus the text rewrites for every reference.
#[derive(Debug)]
pub(crate) struct FigurePlan {
    pub figures: Vec<PlannedFigure>,
    pub rewrites: Vec<(Range<usize>, String)>,
}

impl FigurePlan {
    /// Resolve every referenced figure and fix its final name.
    ///
    /// References are deduplicated by the written directory and stem,
    /// so `plots/mass` cited twice is one figure with one number, while
    /// `mass` and `other/mass` stay distinct.
    pub fn build(
        commands: &[FigureCommand],
        resolver: &FigureResolver,
        style: PackStyle,
        size_cap: Option<u64>,
    ) -> Result<Self> {
        let mut figures: Vec<PlannedFigure> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut rewrites = Vec::new();

        for command in commands {
            let key = plan_key(&command.argument);
            let index = match seen.get(&key) {
                Some(&index) => index,
                None => {
                    let resolved = resolver.resolve(&command.argument)?;
                    let number = figures.len() + 1;
                    let transcode = size_cap.is_some_and(|cap| resolved.size > cap);
                    let final_ext = if transcode {
                        "jpg".to_string()
                    } else {
                        resolved.ext.clone()
                    };
                    let final_stem = if style.renames_figures() {
                        format!("f{number}")
                    } else {
                        resolved.base.clone()
                    };
                    figures.push(PlannedFigure {
                        resolved,
                        number,
                        final_stem,
                        final_ext,
                        transcode,
                    });
                    seen.insert(key, figures.len() - 1);
                    figures.len() - 1
                }
            };

            let figure = &figures[index];
            let new_argument = if command.has_extension() {
                format!("{}.{}", figure.final_stem, figure.final_ext)
            } else {
                figure.final_stem.clone()
            };
            rewrites.push((command.arg_span.clone(), new_argument));
        }

        Ok(Self { figures, rewrites })
    }
}

/// Deduplication key: written directory plus extension-less stem.
fn plan_key(argument: &str) -> String {
    let path = std::path::Path::new(argument);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.parent() {
        Some(dir) if dir != std::path::Path::new("") => format!("{}/{stem}", dir.display()),
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tex::scan_figures;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn resolver(dir: &Path) -> FigureResolver {
        FigureResolver::new(
            vec![dir.to_path_buf()],
            vec!["pdf".to_string(), "eps".to_string()],
        )
    }

    #[test]
    fn test_numbers_follow_first_appearance() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("b.pdf"), vec![0u8; 4]).unwrap();
        fs::write(dir.path().join("a.pdf"), vec![0u8; 4]).unwrap();

        let commands = scan_figures("\\includegraphics{b}\n\\includegraphics{a}\n");
        let plan =
            FigurePlan::build(&commands, &resolver(dir.path()), PackStyle::Aastex, None).unwrap();

        assert_eq!(plan.figures[0].resolved.base, "b");
        assert_eq!(plan.figures[0].final_stem, "f1");
        assert_eq!(plan.figures[1].resolved.base, "a");
        assert_eq!(plan.figures[1].final_stem, "f2");
    }

    #[test]
    fn test_repeat_reference_shares_number() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("map.pdf"), vec![0u8; 4]).unwrap();

        let commands =
            scan_figures("\\includegraphics{map}\ntext\n\\includegraphics[width=5cm]{map}\n");
        let plan =
            FigurePlan::build(&commands, &resolver(dir.path()), PackStyle::Aastex, None).unwrap();

        assert_eq!(plan.figures.len(), 1);
        assert_eq!(plan.rewrites.len(), 2);
        assert!(plan.rewrites.iter().all(|(_, name)| name == "f1"));
    }

    #[test]
    fn test_same_stem_different_directories_stay_distinct() {
        let dir = TempDir::new().expect("tempdir");
        fs::create_dir(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("flux.pdf"), vec![0u8; 4]).unwrap();
        fs::write(dir.path().join("app/flux.pdf"), vec![0u8; 4]).unwrap();

        let commands = scan_figures("\\includegraphics{flux}\n\\includegraphics{app/flux}\n");
        let plan =
            FigurePlan::build(&commands, &resolver(dir.path()), PackStyle::Aastex, None).unwrap();

        assert_eq!(plan.figures.len(), 2);
    }

    #[test]
    fn test_arxiv_keeps_stems_and_marks_oversized() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("huge.pdf"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("tiny.pdf"), vec![0u8; 5]).unwrap();

        let commands = scan_figures("\\includegraphics{huge}\n\\includegraphics{tiny}\n");
        let plan = FigurePlan::build(&commands, &resolver(dir.path()), PackStyle::Arxiv, Some(50))
            .unwrap();

        assert_eq!(plan.figures[0].final_stem, "huge");
        assert!(plan.figures[0].transcode);
        assert_eq!(plan.figures[0].final_ext, "jpg");
        assert!(!plan.figures[1].transcode);
        assert_eq!(plan.figures[1].final_ext, "pdf");
    }

    #[test]
    fn test_rewrite_extension_follows_written_form() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("sky.pdf"), vec![0u8; 4]).unwrap();

        let commands = scan_figures("\\includegraphics{sky.eps}\n\\includegraphics{sky}\n");
        let plan =
            FigurePlan::build(&commands, &resolver(dir.path()), PackStyle::Aastex, None).unwrap();

        // written with an extension: rewritten name carries the final one
        assert_eq!(plan.rewrites[0].1, "f1.pdf");
        // written bare: rewritten name stays bare
        assert_eq!(plan.rewrites[1].1, "f1");
    }

    #[test]
    fn test_missing_figure_aborts_planning() {
        let dir = TempDir::new().expect("tempdir");
        let commands = scan_figures("\\includegraphics{nowhere}\n");
        let err = FigurePlan::build(&commands, &resolver(dir.path()), PackStyle::Aastex, None)
            .unwrap_err();
        assert!(matches!(err, crate::Error::MissingFigure { .. }));
    }
}
