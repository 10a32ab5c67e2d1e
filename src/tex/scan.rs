//! Low-level line scanning shared by the LaTeX passes.

use memchr::memchr_iter;

/// Environments whose content must never be touched by any pass.
pub(crate) const VERBATIM_ENVS: &[&str] = &["verbatim", "verbatim*", "lstlisting"];

/// Byte offset of the first unescaped `%` in `line`, if any.
///
/// A `%` counts as escaped when preceded by an odd number of
/// backslashes, so `\%` is literal while `\\%` starts a comment.
pub(crate) fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    for pos in memchr_iter(b'%', bytes) {
        let mut backslashes = 0;
        while backslashes < pos && bytes[pos - backslashes - 1] == b'\\' {
            backslashes += 1;
        }
        if backslashes % 2 == 0 {
            return Some(pos);
        }
    }
    None
}

/// Earliest `\begin{<env>}` of a verbatim-like environment in `line`.
pub(crate) fn env_begin(line: &str) -> Option<(usize, &'static str)> {
    VERBATIM_ENVS
        .iter()
        .filter_map(|env| {
            line.find(&format!("\\begin{{{env}}}"))
                .map(|pos| (pos, *env))
        })
        .min_by_key(|&(pos, _)| pos)
}

/// Position of `\end{<env>}` at or after byte offset `from`.
pub(crate) fn env_end_from(line: &str, from: usize, env: &str) -> Option<usize> {
    line[from..]
        .find(&format!("\\end{{{env}}}"))
        .map(|pos| from + pos)
}

/// The scannable portion of one source line.
pub(crate) struct VisibleLine<'a> {
    /// Byte offset of the line start within the scanned text.
    pub offset: usize,
    /// 1-based line number.
    pub number: usize,
    /// The part of the line before any comment, empty inside verbatim
    /// environments.
    pub visible: &'a str,
}

/// Split `tex` into lines, blanking out comments and verbatim content.
///
/// Offsets refer to the original text, so matches found in `visible`
/// can be mapped back to absolute byte ranges.
pub(crate) fn visible_lines(tex: &str) -> Vec<VisibleLine<'_>> {
    let mut lines = Vec::new();
    let mut verbatim: Option<&'static str> = None;
    let mut offset = 0;

    for (index, line) in tex.split_inclusive('\n').enumerate() {
        let visible = match verbatim {
            Some(env) => {
                if env_end_from(line, 0, env).is_some() {
                    verbatim = None;
                }
                // the closing line is left unscanned as a whole
                ""
            }
            None => {
                let mut visible = match comment_start(line) {
                    Some(pos) => &line[..pos],
                    None => line,
                };
                if let Some((pos, env)) = env_begin(visible) {
                    if env_end_from(line, pos, env).is_none() {
                        verbatim = Some(env);
                    }
                    visible = &visible[..pos];
                }
                visible
            }
        };
        lines.push(VisibleLine {
            offset,
            number: index + 1,
            visible,
        });
        offset += line.len();
    }

    lines
}
