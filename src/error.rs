//! Error types for the analysis pipeline.

use std::path::PathBuf;

use polars::error::PolarsError;

/// Fatal conditions surfaced by the pipeline stages.
///
/// Any of these aborts the run; no partial results are produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file is missing, unreadable, or lacks an expected column.
    #[error("{}: {reason}", .path.display())]
    FileFormat { path: PathBuf, reason: String },

    /// A mandatory field failed to parse.
    #[error("row {row}: cannot parse {value:?} as {expected}")]
    Parse {
        row: usize,
        value: String,
        expected: String,
    },

    /// A clustering parameter is out of range for the data at hand.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The configuration file could not be read or decoded.
    #[error("config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// A chart could not be rendered.
    #[error("render: {0}")]
    Render(String),

    /// An internal dataframe operation failed.
    #[error(transparent)]
    DataFrame(#[from] PolarsError),
}
