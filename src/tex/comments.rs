//! Comment stripping.

use super::scan::{comment_start, env_begin, env_end_from};

/// Remove LaTeX comments: everything from an unescaped `%` through the
/// end of its line.
///
/// Escaped percent signs (`\%`) survive, and lines inside
/// `verbatim`, `verbatim*`, and `lstlisting` environments are copied
/// byte for byte including any `%` they contain. A `\begin` that is
/// itself commented out does not open an environment.
pub fn strip_comments(tex: &str) -> String {
    let mut out = String::with_capacity(tex.len());
    let mut verbatim: Option<&'static str> = None;

    for line in tex.split_inclusive('\n') {
        if let Some(env) = verbatim {
            out.push_str(line);
            if env_end_from(line, 0, env).is_some() {
                verbatim = None;
            }
            continue;
        }

        let comment = comment_start(line);
        let visible = match comment {
            Some(pos) => &line[..pos],
            None => line,
        };

        if let Some((pos, env)) = env_begin(visible) {
            // lines opening a verbatim environment are preserved whole
            out.push_str(line);
            if env_end_from(line, pos, env).is_none() {
                verbatim = Some(env);
            }
            continue;
        }

        match comment {
            Some(pos) => {
                out.push_str(&line[..pos]);
                if line.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => out.push_str(line),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_to_end_of_line() {
        assert_eq!(
            strip_comments("results. % check this\nNext line.\n"),
            "results. \nNext line.\n"
        );
    }

    #[test]
    fn test_escaped_percent_survives() {
        assert_eq!(
            strip_comments("We used 50\\% of the sample.\n"),
            "We used 50\\% of the sample.\n"
        );
    }

    #[test]
    fn test_double_backslash_starts_comment() {
        assert_eq!(strip_comments("a & b \\\\% trailing\n"), "a & b \\\\\n");
    }

    #[test]
    fn test_full_line_comment_leaves_blank_line() {
        assert_eq!(strip_comments("% private note\ntext\n"), "\ntext\n");
    }

    #[test]
    fn test_verbatim_preserved_byte_for_byte() {
        let tex = "before % gone\n\\begin{verbatim}\n  x = 100 % stays\n\\end{verbatim}\nafter % gone\n";
        assert_eq!(
            strip_comments(tex),
            "before \n\\begin{verbatim}\n  x = 100 % stays\n\\end{verbatim}\nafter \n"
        );
    }

    #[test]
    fn test_verbatim_star_preserved() {
        let tex = "\\begin{verbatim*}\n% literal\n\\end{verbatim*}\n";
        assert_eq!(strip_comments(tex), tex);
    }

    #[test]
    fn test_lstlisting_preserved() {
        let tex = "\\begin{lstlisting}\nprintf(\"100%%\"); % code comment\n\\end{lstlisting}\n";
        assert_eq!(strip_comments(tex), tex);
    }

    #[test]
    fn test_commented_out_begin_does_not_open() {
        let tex = "% \\begin{verbatim}\nvisible % comment\n";
        assert_eq!(strip_comments(tex), "\nvisible \n");
    }

    #[test]
    fn test_single_line_verbatim_does_not_leak_state() {
        let tex = "\\begin{verbatim}x % y\\end{verbatim}\nnext % gone\n";
        assert_eq!(
            strip_comments(tex),
            "\\begin{verbatim}x % y\\end{verbatim}\nnext \n"
        );
    }

    #[test]
    fn test_no_trailing_newline() {
        assert_eq!(strip_comments("last % comment"), "last ");
    }

    proptest! {
        /// Without backslashes or verbatim markers in play, no `%` can
        /// survive stripping.
        #[test]
        fn prop_no_percent_survives(lines in proptest::collection::vec("[a-zA-Z0-9 {}.,$_=-]{0,30}", 0..20),
                                    comments in proptest::collection::vec("[a-zA-Z0-9 ]{0,15}", 0..20)) {
            let mut tex = String::new();
            for (line, comment) in lines.iter().zip(comments.iter()) {
                tex.push_str(line);
                tex.push('%');
                tex.push_str(comment);
                tex.push('\n');
            }
            let stripped = strip_comments(&tex);
            prop_assert!(!stripped.contains('%'));
            prop_assert_eq!(stripped.lines().count(), tex.lines().count());
        }

        /// Text with no comment characters passes through unchanged.
        #[test]
        fn prop_comment_free_text_unchanged(tex in "[a-zA-Z0-9 {}\\n.,$_=-]{0,400}") {
            prop_assert_eq!(strip_comments(&tex), tex);
        }
    }
}
