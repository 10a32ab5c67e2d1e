//! # preprint
//!
//! Tools for preparing LaTeX scientific manuscripts: compile them,
//! build diff-highlighted revisions against an earlier git commit, and
//! package everything into a self-contained bundle for journal or
//! arXiv submission.
//!
//! ## Features
//!
//! - Flatten multi-file projects: `\input` and `\InputIfFileExists`
//!   are inlined recursively, with cycle detection
//! - Strip comments without touching verbatim environments
//! - Select figure files by extension priority and rewrite the
//!   manuscript to match, with journal-style `f1`, `f2` naming
//! - Copy or splice the compiled bibliography, per submission style
//! - Convert oversized figures to JPEG for arXiv's size limits
//!
//! ## Quick Start
//!
//! ```no_run
//! use preprint::pack::{self, PackOptions, PackStyle};
//! use preprint::tool::ImageMagick;
//!
//! let mut options = PackOptions::new("article.tex");
//! options.name = "submission".to_string();
//! options.style = PackStyle::Arxiv;
//!
//! let report = pack::run(&options, &ImageMagick::default())?;
//! println!("packaged {} files", report.artifacts.len());
//! # Ok::<(), preprint::Error>(())
//! ```
//!
//! ## Working with the Text Passes
//!
//! The transforms the pipeline is built from are plain functions over
//! strings and can be used on their own:
//!
//! ```
//! use preprint::tex;
//!
//! let source = "intro % fix wording\n\\includegraphics{plots/mass}\n";
//! let clean = tex::strip_comments(source);
//! assert_eq!(clean, "intro \n\\includegraphics{plots/mass}\n");
//!
//! let figures = tex::scan_figures(&clean);
//! assert_eq!(figures[0].argument, "plots/mass");
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod figures;
pub mod io;
pub mod manuscript;
pub mod pack;
pub mod tex;
pub mod tool;
pub mod util;

pub use error::{Error, Result};
pub use manuscript::{find_root_document, ManuscriptTree};
pub use pack::{PackOptions, PackReport, PackStyle};
