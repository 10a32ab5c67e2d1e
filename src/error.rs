//! Error types for preprint operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing or packaging a manuscript.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("master document not found: {}", .0.display())]
    MissingMasterFile(PathBuf),

    #[error("include cycle: {}", .chain.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    IncludeCycle { chain: Vec<PathBuf> },

    // the including file must not be called `source`, or thiserror
    // would try to expose it as the error's cause
    #[error("missing include {} (from {}, line {line})", .target.display(), .within.display())]
    MissingInclude {
        target: PathBuf,
        within: PathBuf,
        line: usize,
    },

    #[error("figure '{name}' not found (tried extensions: {})", .attempted.join(", "))]
    MissingFigure { name: String, attempted: Vec<String> },

    #[error("bibliography required but {} does not exist", .expected.display())]
    BibliographyUnavailable { expected: PathBuf },

    #[error("could not transcode {}: {detail}", .figure.display())]
    TranscodeFailed { figure: PathBuf, detail: String },

    #[error("{} is {actual} bytes after transcoding (limit {limit})", .figure.display())]
    SizeLimitExceeded {
        figure: PathBuf,
        actual: u64,
        limit: u64,
    },

    #[error("required tool not found: {0}")]
    ToolUnavailable(String),

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("pack failed during {stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
