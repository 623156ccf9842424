//! Error types for the data-loader crate.
//!
//! Every failure carries enough context (file, line, offending value) to
//! point at the broken record without re-reading the input.

use thiserror::Error;

/// Errors that can occur while loading ratings and the movie catalog
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Neither the CSV nor the `.dat` layout was found in the directory
    #[error("No ratings file found in {dir} (expected ratings.csv or ratings.dat)")]
    MissingDataset { dir: String },

    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reader rejected a record (bad quoting, wrong field type, ...)
    #[error("CSV error in {file}: {source}")]
    CsvError {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// Line in a `::` separated data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
