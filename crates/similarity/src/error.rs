//! Error types for matrix construction and neighbor search.

use data_loader::MovieId;
use std::fmt;
use thiserror::Error;

/// Which identifier space an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Movie,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKind::User => write!(f, "user"),
            IdKind::Movie => write!(f, "movie"),
        }
    }
}

/// Errors raised while building the rating matrix or querying neighbors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// No observations to build identifier maps or a matrix from
    #[error("Cannot build a rating matrix from an empty dataset")]
    EmptyDataset,

    /// An observation references an id the identifier maps don't know
    #[error("Unknown {kind} id {id}: not present in the identifier maps")]
    UnknownIdentifier { kind: IdKind, id: u32 },

    /// Query for a movie that has no row in the matrix
    #[error("Unknown movie id {0}")]
    UnknownMovie(MovieId),

    /// More neighbors requested than other movies exist (strict policy only)
    #[error("Requested {requested} neighbors but only {available} other movies exist")]
    InsufficientCandidates { requested: usize, available: usize },

    /// Matrix and identifier maps come from different snapshots
    #[error(
        "Matrix shape {rows}x{cols} does not match identifier maps ({movies} movies, {users} users)"
    )]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        movies: usize,
        users: usize,
    },

    /// Unrecognised `--metric` / config value
    #[error("Unknown distance metric '{0}' (expected cosine, euclidean or manhattan)")]
    UnknownMetric(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SimilarityError>;
