//! Include directive scanning.

use std::ops::Range;

use regex_lite::Regex;

use super::scan::visible_lines;

/// How strictly an include directive treats a missing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// `\input{...}`: the target must exist.
    Required,
    /// `\InputIfFileExists{...}{...}{...}`: a missing target is skipped.
    Conditional,
}

/// One include directive found in source text.
#[derive(Debug, Clone)]
pub struct IncludeDirective {
    pub kind: IncludeKind,
    /// Target exactly as written, without any `.tex` appended.
    pub target: String,
    /// Byte range of the whole directive.
    pub span: Range<usize>,
    /// 1-based source line of the directive.
    pub line: usize,
}

/// Find every include directive in `tex`, in document order.
///
/// Directives behind a comment or inside a verbatim environment are
/// ignored. A directive must fit on one line.
pub fn scan_includes(tex: &str) -> Vec<IncludeDirective> {
    let required = Regex::new(r"\\input\{([^}]*)\}").unwrap();
    let conditional = Regex::new(r"\\InputIfFileExists\{([^}]*)\}\{[^}]*\}\{[^}]*\}").unwrap();

    let mut directives = Vec::new();
    for line in visible_lines(tex) {
        for (kind, pattern) in [
            (IncludeKind::Required, &required),
            (IncludeKind::Conditional, &conditional),
        ] {
            for caps in pattern.captures_iter(line.visible) {
                let whole = caps.get(0).unwrap();
                directives.push(IncludeDirective {
                    kind,
                    target: caps[1].to_string(),
                    span: line.offset + whole.start()..line.offset + whole.end(),
                    line: line.number,
                });
            }
        }
    }
    directives.sort_by_key(|d| d.span.start);
    directives
}
