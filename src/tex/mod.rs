//! Pure text transforms over LaTeX source.
//!
//! Every pass here is a plain function from text to text (or to a list
//! of matches), so each can be tested in isolation and composed by the
//! packaging pipeline:
//!
//! - comment stripping (verbatim-aware)
//! - include directive scanning
//! - figure command scanning and argument rewriting
//! - bibliography command handling
//! - blank line normalization
//!
//! All scanners share one rule: text behind an unescaped `%` or inside a
//! verbatim-like environment is never matched.

mod bibliography;
mod comments;
mod figures;
mod include;
mod normalize;
mod scan;

pub use bibliography::{find_bibliography_command, has_inline_bibliography, splice_bibliography};
pub use comments::strip_comments;
pub use figures::{rewrite_spans, scan_figures, FigureCommand};
pub use include::{scan_includes, IncludeDirective, IncludeKind};
pub use normalize::collapse_blank_lines;
