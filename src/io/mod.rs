//! Content sources for manuscript resolution.

mod reader;

pub use reader::{FsReader, GitReader, MemoryReader, SourceReader};
