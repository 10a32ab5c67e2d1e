//! Bibliography command handling.

use std::ops::Range;

use regex_lite::Regex;

use super::scan::visible_lines;

/// True if the text already embeds a `thebibliography` environment.
pub fn has_inline_bibliography(tex: &str) -> bool {
    tex.contains("\\begin{thebibliography}")
}

/// Byte range of the first `\bibliography{...}` command, if any.
///
/// `\bibliographystyle{...}` does not match. Commands behind comments
/// or inside verbatim environments are ignored.
pub fn find_bibliography_command(tex: &str) -> Option<Range<usize>> {
    let pattern = Regex::new(r"\\bibliography\{[^}]*\}").unwrap();
    for line in visible_lines(tex) {
        if let Some(found) = pattern.find(line.visible) {
            return Some(line.offset + found.start()..line.offset + found.end());
        }
    }
    None
}

/// Splice compiled bibliography text into the manuscript.
///
/// The `\bibliography{...}` command is replaced when present; otherwise
/// the text is inserted just before `\end{document}`. Returns `None`
/// when there is no place to put it.
pub fn splice_bibliography(tex: &str, bbl: &str) -> Option<String> {
    let bbl = bbl.trim_end();

    if let Some(span) = find_bibliography_command(tex) {
        let mut out = String::with_capacity(tex.len() + bbl.len());
        out.push_str(&tex[..span.start]);
        out.push_str(bbl);
        out.push_str(&tex[span.end..]);
        return Some(out);
    }

    let end = tex.rfind("\\end{document}")?;
    let mut out = String::with_capacity(tex.len() + bbl.len() + 2);
    out.push_str(&tex[..end]);
    out.push_str(bbl);
    out.push('\n');
    out.push_str(&tex[end..]);
    Some(out)
}
