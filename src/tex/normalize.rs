//! Whitespace normalization.

use super::scan::{comment_start, env_begin, env_end_from};

/// Collapse runs of blank lines to a single blank line.
///
/// Inlining and comment stripping leave gaps behind; to TeX a run of
/// blank lines is one paragraph break anyway. Whitespace-only lines
/// count as blank and come out empty. Blank lines inside verbatim
/// environments are preserved exactly.
pub fn collapse_blank_lines(tex: &str) -> String {
    let mut out = String::with_capacity(tex.len());
    let mut verbatim: Option<&'static str> = None;
    let mut last_was_blank = false;

    for line in tex.split_inclusive('\n') {
        if let Some(env) = verbatim {
            out.push_str(line);
            if env_end_from(line, 0, env).is_some() {
                verbatim = None;
            }
            last_was_blank = false;
            continue;
        }

        if line.trim().is_empty() {
            if !last_was_blank {
                out.push('\n');
                last_was_blank = true;
            }
            continue;
        }

        out.push_str(line);
        last_was_blank = false;

        let visible = match comment_start(line) {
            Some(pos) => &line[..pos],
            None => line,
        };
        if let Some((pos, env)) = env_begin(visible) {
            if env_end_from(line, pos, env).is_none() {
                verbatim = Some(env);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_runs_of_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn test_single_blank_lines_untouched() {
        let tex = "a\n\nb\n\nc\n";
        assert_eq!(collapse_blank_lines(tex), tex);
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        assert_eq!(collapse_blank_lines("a\n  \n\t\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn test_verbatim_blank_runs_preserved() {
        let tex = "\\begin{verbatim}\n\n\n\n\\end{verbatim}\n";
        assert_eq!(collapse_blank_lines(tex), tex);
    }

    #[test]
    fn test_no_blank_lines_is_identity() {
        let tex = "a\nb\nc\n";
        assert_eq!(collapse_blank_lines(tex), tex);
    }
}
