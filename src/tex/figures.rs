//! Figure command scanning and argument rewriting.

use std::ops::Range;
use std::path::Path;

use regex_lite::Regex;

use super::scan::visible_lines;

/// One `\includegraphics` command found in source text.
#[derive(Debug, Clone)]
pub struct FigureCommand {
    /// Argument exactly as written between the braces.
    pub argument: String,
    /// Byte range of the whole command.
    pub span: Range<usize>,
    /// Byte range of the argument between the braces.
    pub arg_span: Range<usize>,
    /// 1-based source line.
    pub line: usize,
}

impl FigureCommand {
    /// True when the written argument carries a file extension.
    pub fn has_extension(&self) -> bool {
        Path::new(&self.argument).extension().is_some()
    }
}

/// Find every `\includegraphics` command in `tex`, in document order.
///
/// Optional `[...]` arguments are tolerated and left untouched;
/// commands behind comments or inside verbatim environments are
/// skipped.
pub fn scan_figures(tex: &str) -> Vec<FigureCommand> {
    let pattern = Regex::new(r"\\includegraphics\s*(\[[^\]]*\])?\s*\{([^}]*)\}").unwrap();

    let mut commands = Vec::new();
    for line in visible_lines(tex) {
        for caps in pattern.captures_iter(line.visible) {
            let whole = caps.get(0).unwrap();
            let arg = caps.get(2).unwrap();
            commands.push(FigureCommand {
                argument: arg.as_str().to_string(),
                span: line.offset + whole.start()..line.offset + whole.end(),
                arg_span: line.offset + arg.start()..line.offset + arg.end(),
                line: line.number,
            });
        }
    }
    commands
}

/// Replace byte ranges of `tex` with new text.
///
/// Replacements are applied back to front so that earlier spans stay
/// valid while later ones are spliced in. Spans must not overlap.
pub fn rewrite_spans(tex: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut sorted: Vec<&(Range<usize>, String)> = replacements.iter().collect();
    sorted.sort_by_key(|(span, _)| span.start);

    let mut out = tex.to_string();
    for (span, replacement) in sorted.into_iter().rev() {
        out.replace_range(span.clone(), replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_plain_command() {
        let found = scan_figures("\\includegraphics{fig1}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].argument, "fig1");
        assert!(!found[0].has_extension());
    }

    #[test]
    fn test_scan_with_options() {
        let tex = "\\includegraphics[width=0.5\\textwidth]{plots/mass_radius.pdf}";
        let found = scan_figures(tex);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].argument, "plots/mass_radius.pdf");
        assert!(found[0].has_extension());
    }

    #[test]
    fn test_arg_span_points_at_argument() {
        let tex = "x \\includegraphics[scale=2]{fig} y";
        let found = scan_figures(tex);
        assert_eq!(&tex[found[0].arg_span.clone()], "fig");
        assert_eq!(
            &tex[found[0].span.clone()],
            "\\includegraphics[scale=2]{fig}"
        );
    }

    #[test]
    fn test_multiple_commands_in_order() {
        let tex = "\\includegraphics{a}\ntext\n\\includegraphics{b}\n";
        let found = scan_figures(tex);
        assert_eq!(found[0].argument, "a");
        assert_eq!(found[1].argument, "b");
        assert_eq!(found[1].line, 3);
    }

    #[test]
    fn test_commented_command_skipped() {
        let found = scan_figures("% \\includegraphics{draft}\n\\includegraphics{final}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].argument, "final");
    }

    #[test]
    fn test_verbatim_command_skipped() {
        let tex = "\\begin{verbatim}\n\\includegraphics{demo}\n\\end{verbatim}\n";
        assert!(scan_figures(tex).is_empty());
    }

    #[test]
    fn test_rewrite_spans_preserves_surroundings() {
        let tex = "\\includegraphics[width=\\hsize]{plots/orbit.pdf}";
        let found = scan_figures(tex);
        let out = rewrite_spans(tex, &[(found[0].arg_span.clone(), "f1.pdf".to_string())]);
        assert_eq!(out, "\\includegraphics[width=\\hsize]{f1.pdf}");
    }

    #[test]
    fn test_rewrite_spans_multiple_unsorted() {
        let tex = "\\includegraphics{a} \\includegraphics{b}";
        let found = scan_figures(tex);
        let out = rewrite_spans(
            tex,
            &[
                (found[1].arg_span.clone(), "f2".to_string()),
                (found[0].arg_span.clone(), "f1".to_string()),
            ],
        );
        assert_eq!(out, "\\includegraphics{f1} \\includegraphics{f2}");
    }
}
